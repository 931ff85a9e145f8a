// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use jiff::civil::date;
use shiftsync_core::localdb::{ShiftContent, SyncStatus};
use shiftsync_core::{CalendarChange, SyncCounts};

use crate::common::{IcsBuilder, ScriptedSource, test_env};

fn abc() -> String {
    IcsBuilder::new()
        .event("A", "Early", "20250110T060000Z", "20250110T140000Z")
        .event("B", "Late", "20250111T140000Z", "20250111T220000Z")
        .event("C", "Night", "20250112T220000Z", "20250113T060000Z")
        .build()
}

fn a_changed_c_d() -> String {
    IcsBuilder::new()
        .event("A", "Early (swapped)", "20250110T070000Z", "20250110T150000Z")
        .event("C", "Night", "20250112T220000Z", "20250113T060000Z")
        .all_day("D", "Training", "20250114")
        .build()
}

#[tokio::test]
async fn sync_first_run_creates_every_event() {
    // Arrange
    let source = Arc::new(ScriptedSource::new(abc()));
    let env = test_env(source).await;

    // Act
    let counts = env.engine.run_sync(env.feed_id()).await.unwrap();

    // Assert
    assert_eq!(
        counts,
        SyncCounts {
            created: 3,
            updated: 0,
            deleted: 0,
            unchanged: 0,
            total_seen: 3,
        }
    );
    assert_eq!(env.external_ids().await, vec!["A", "B", "C"]);

    let shifts = env.db().shifts.list_by_calendar(&env.calendar_id).await.unwrap();
    let night = shifts.iter().find(|s| s.external_id() == Some("C")).unwrap();
    assert_eq!(night.date(), Some(date(2025, 1, 12)));
    assert_eq!((night.start_time(), night.end_time()), ("22:00", "06:00"));
    assert_eq!(night.color(), Some("#10b981"));
    assert!(night.synced());
    assert_eq!(night.feed_id(), Some(env.feed_id()));
}

#[tokio::test]
async fn sync_second_run_applies_inserts_updates_and_deletes() {
    // Arrange
    let source = Arc::new(ScriptedSource::new(abc()));
    let env = test_env(source.clone()).await;
    env.engine.run_sync(env.feed_id()).await.unwrap();
    let before = env.db().shifts.list_by_feed(env.feed_id()).await.unwrap();
    let a_before = before.iter().find(|s| s.external_id() == Some("A")).unwrap();

    // Act
    source.set_body(a_changed_c_d());
    let counts = env.engine.run_sync(env.feed_id()).await.unwrap();

    // Assert
    assert_eq!((counts.created, counts.updated, counts.deleted), (1, 1, 1));
    assert_eq!(counts.unchanged, 1);
    assert_eq!(env.external_ids().await, vec!["A", "C", "D"]);

    let a_after = env.db().shifts.get(a_before.id()).await.unwrap().unwrap();
    assert_eq!(a_after.title(), "Early (swapped)");
    assert_eq!((a_after.start_time(), a_after.end_time()), ("07:00", "15:00"));

    let d = env
        .db()
        .shifts
        .list_by_feed(env.feed_id())
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.external_id() == Some("D"))
        .unwrap();
    assert!(d.all_day());
    assert_eq!((d.start_time(), d.end_time()), ("00:00", "23:59"));
}

#[tokio::test]
async fn sync_is_idempotent() {
    let source = Arc::new(ScriptedSource::new(abc()));
    let env = test_env(source).await;
    env.engine.run_sync(env.feed_id()).await.unwrap();

    let second = env.engine.run_sync(env.feed_id()).await.unwrap();
    let third = env.engine.run_sync(env.feed_id()).await.unwrap();

    assert_eq!((second.created, second.updated, second.deleted), (0, 0, 0));
    assert_eq!(second.unchanged, 3);
    assert_eq!(third, second);
    assert_eq!(env.external_ids().await, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn sync_retains_exactly_the_parsed_ids() {
    let source = Arc::new(ScriptedSource::new(abc()));
    let env = test_env(source.clone()).await;
    env.engine.run_sync(env.feed_id()).await.unwrap();

    source.set_body(IcsBuilder::new().build());
    let counts = env.engine.run_sync(env.feed_id()).await.unwrap();
    assert_eq!((counts.deleted, counts.total_seen), (3, 0));
    assert!(env.external_ids().await.is_empty());

    source.set_body(
        IcsBuilder::new()
            .event("X", "Day", "20250201T080000Z", "20250201T160000Z")
            .build(),
    );
    env.engine.run_sync(env.feed_id()).await.unwrap();
    assert_eq!(env.external_ids().await, vec!["X"]);
}

#[tokio::test]
async fn sync_never_touches_user_authored_shifts() {
    // Arrange
    let source = Arc::new(ScriptedSource::new(abc()));
    let env = test_env(source.clone()).await;
    let manual = ShiftContent {
        date: date(2025, 1, 10),
        start_time: "06:00".to_string(),
        end_time: "14:00".to_string(),
        all_day: false,
        title: "Early".to_string(),
        description: Some("swapped with a colleague".to_string()),
        color: None,
    };
    let authored = env
        .db()
        .shifts
        .insert_authored(&env.calendar_id, &manual)
        .await
        .unwrap();

    // Act
    env.engine.run_sync(env.feed_id()).await.unwrap();
    source.set_body(IcsBuilder::new().build());
    env.engine.run_sync(env.feed_id()).await.unwrap();

    // Assert
    let kept = env.db().shifts.get(authored.id()).await.unwrap().unwrap();
    assert_eq!(kept, authored);
    assert_eq!(
        env.db().shifts.list_by_calendar(&env.calendar_id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn sync_logs_success_and_stamps_feed() {
    let source = Arc::new(ScriptedSource::new(abc()));
    let env = test_env(source).await;
    assert!(env.reload_feed().await.last_synced_at().is_none());

    env.engine.run_sync(env.feed_id()).await.unwrap();

    assert!(env.reload_feed().await.last_synced_at().is_some());
    let entries = env.db().sync_logs.list(env.feed_id(), None).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status(), SyncStatus::Success);
    assert_eq!(entries[0].message(), "3 created, 0 updated, 0 deleted");
    assert_eq!(entries[0].counts().map(|c| c.total_seen), Some(3));
}

#[tokio::test]
async fn sync_publishes_calendar_change() {
    let source = Arc::new(ScriptedSource::new(abc()));
    let mut env = test_env(source).await;

    env.engine.run_sync(env.feed_id()).await.unwrap();

    let change = env.changes.try_recv().expect("a change should be published");
    assert_eq!(
        change,
        CalendarChange {
            calendar_id: env.calendar_id.clone()
        }
    );
}

#[tokio::test]
async fn sync_failure_is_logged_and_leaves_state() {
    // Arrange
    let source = Arc::new(ScriptedSource::new(abc()));
    let mut env = test_env(source.clone()).await;
    env.engine.run_sync(env.feed_id()).await.unwrap();
    let stamped = env.reload_feed().await.last_synced_at();
    let _ = env.changes.try_recv();

    // Act
    source.fail_with_timeout();
    let err = env.engine.run_sync(env.feed_id()).await.unwrap_err();

    // Assert
    assert_eq!(err.to_string(), "fetch timeout");
    assert_eq!(env.reload_feed().await.last_synced_at(), stamped);
    assert_eq!(env.external_ids().await, vec!["A", "B", "C"]);
    assert!(env.changes.try_recv().is_err());

    let entries = env.db().sync_logs.list(env.feed_id(), Some(1)).await.unwrap();
    assert_eq!(entries[0].status(), SyncStatus::Error);
    assert_eq!(entries[0].message(), "fetch timeout");
    assert_eq!(env.db().sync_logs.unread_error_count(env.feed_id()).await.unwrap(), 1);
}

#[tokio::test]
async fn sync_parse_failure_is_logged() {
    let source = Arc::new(ScriptedSource::new("<html>not a calendar</html>"));
    let env = test_env(source).await;

    let err = env.engine.run_sync(env.feed_id()).await.unwrap_err();

    assert!(matches!(err, shiftsync_core::SyncError::ParseFailed(_)), "got {err:?}");
    let entries = env.db().sync_logs.list(env.feed_id(), None).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status(), SyncStatus::Error);
    assert!(entries[0].message().starts_with("parse failed"));
}
