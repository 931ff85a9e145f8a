// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use shiftsync_core::localdb::{FeedPatch, SyncStatus};
use shiftsync_core::{DEFAULT_FEED_COLOR, NewFeed, SyncEngine, SyncError};
use shiftsync_feed::{InvalidSourceUrl, UrlPolicy};

use crate::common::{IcsBuilder, ScriptedSource, TestEnv, test_env, test_options};

async fn env() -> (TestEnv, Arc<ScriptedSource>) {
    let source = Arc::new(ScriptedSource::new(
        IcsBuilder::new()
            .event("A", "Early", "20250110T060000Z", "20250110T140000Z")
            .build(),
    ));
    (test_env(source.clone()).await, source)
}

fn new_feed(env: &TestEnv, url: &str) -> NewFeed {
    NewFeed {
        calendar_id: env.calendar_id.clone(),
        name: "Other rota".to_string(),
        url: url.to_string(),
        color: None,
        sync_interval_minutes: None,
    }
}

#[tokio::test]
async fn create_feed_rejects_disallowed_urls() {
    let (env, _) = env().await;

    for url in [
        "http://evil.com",
        "ftp://icloud.com/x",
        "https://icloud.com.evil.com/x",
    ] {
        let err = env.engine.create_feed(new_feed(&env, url)).await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidSourceUrl(_)), "{url}: {err:?}");
    }

    // only the fixture feed exists
    assert_eq!(env.db().feeds.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_feed_accepts_icloud_and_applies_defaults() {
    let (env, _) = env().await;

    for url in [
        "https://p123-caldav.icloud.com/published/x",
        "webcal://p123-caldav.icloud.com/published/x",
    ] {
        let feed = env.engine.create_feed(new_feed(&env, url)).await.unwrap();
        assert_eq!(feed.url(), url);
        assert_eq!(feed.color(), DEFAULT_FEED_COLOR);
        assert_eq!(feed.sync_interval_minutes(), 60);
        assert!(feed.last_synced_at().is_none());
    }
}

#[tokio::test]
async fn create_feed_validates_interval_and_calendar() {
    let (env, _) = env().await;

    let mut zero = new_feed(&env, "https://p1.icloud.com/x");
    zero.sync_interval_minutes = Some(0);
    let err = env.engine.create_feed(zero).await.unwrap_err();
    assert!(matches!(err, SyncError::InvalidInterval));

    let mut orphan = new_feed(&env, "https://p1.icloud.com/x");
    orphan.calendar_id = "missing".to_string();
    let err = env.engine.create_feed(orphan).await.unwrap_err();
    assert!(matches!(err, SyncError::CalendarNotFound(_)));
}

#[tokio::test]
async fn update_feed_revalidates_changed_url() {
    // Arrange
    let (env, _) = env().await;

    // Act
    let err = env
        .engine
        .update_feed(
            env.feed_id(),
            FeedPatch {
                url: Some("https://evilicloud.com/x".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    // Assert
    assert!(
        matches!(err, SyncError::InvalidSourceUrl(InvalidSourceUrl::Host(_))),
        "got {err:?}"
    );
    assert_eq!(env.reload_feed().await.url(), env.feed.url());
}

#[tokio::test]
async fn tightened_policy_does_not_break_saved_feed() {
    // Arrange
    let (env, source) = env().await;
    let strict = SyncEngine::new(
        env.db().clone(),
        source,
        None,
        test_options(UrlPolicy::new(["https"], ["example.org"])),
    );

    // Act
    let counts = strict.run_sync(env.feed_id()).await.unwrap();

    // Assert
    assert_eq!(counts.created, 1);
    let entries = env.db().sync_logs.list(env.feed_id(), None).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status(), SyncStatus::Success);

    // new URLs still go through the current policy
    let err = strict
        .update_feed(
            env.feed_id(),
            FeedPatch {
                url: Some(env.feed.url().to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::InvalidSourceUrl(_)), "got {err:?}");
}

#[tokio::test]
async fn update_feed_changes_fields() {
    let (env, _) = env().await;

    let updated = env
        .engine
        .update_feed(
            env.feed_id(),
            FeedPatch {
                name: Some("Renamed".to_string()),
                color: Some("#ef4444".to_string()),
                sync_interval_minutes: Some(15),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let stored = env.reload_feed().await;
    assert_eq!(stored, updated);
    assert_eq!(stored.name(), "Renamed");
    assert_eq!(stored.color(), "#ef4444");
    assert_eq!(stored.sync_interval_minutes(), 15);
}

#[tokio::test]
async fn feed_color_change_reaches_shifts_on_next_sync() {
    let (env, _) = env().await;
    env.engine.run_sync(env.feed_id()).await.unwrap();

    env.engine
        .update_feed(
            env.feed_id(),
            FeedPatch {
                color: Some("#ef4444".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let counts = env.engine.run_sync(env.feed_id()).await.unwrap();

    assert_eq!(counts.updated, 1);
    let shifts = env.db().shifts.list_by_feed(env.feed_id()).await.unwrap();
    assert_eq!(shifts[0].color(), Some("#ef4444"));
}

#[tokio::test]
async fn delete_feed_removes_shifts_and_logs() {
    // Arrange
    let (env, source) = env().await;
    env.engine.run_sync(env.feed_id()).await.unwrap();
    source.fail_with_status(503);
    let _ = env.engine.run_sync(env.feed_id()).await;

    // Act
    env.engine.delete_feed(env.feed_id()).await.unwrap();

    // Assert
    assert!(env.db().feeds.get(env.feed_id()).await.unwrap().is_none());
    assert!(env.db().shifts.list_by_calendar(&env.calendar_id).await.unwrap().is_empty());
    assert!(env.db().sync_logs.list(env.feed_id(), None).await.unwrap().is_empty());

    let err = env.engine.delete_feed(env.feed_id()).await.unwrap_err();
    assert!(matches!(err, SyncError::FeedNotFound(_)));
}

#[tokio::test]
async fn error_entries_can_be_marked_read_and_cleared() {
    let (env, source) = env().await;
    source.fail_with_status(500);
    for _ in 0..3 {
        let _ = env.engine.run_sync(env.feed_id()).await;
    }

    let logs = &env.db().sync_logs;
    assert_eq!(logs.unread_error_count(env.feed_id()).await.unwrap(), 3);
    assert_eq!(logs.mark_errors_read(env.feed_id()).await.unwrap(), 3);
    assert_eq!(logs.mark_errors_read(env.feed_id()).await.unwrap(), 0);
    assert_eq!(logs.unread_error_count(env.feed_id()).await.unwrap(), 0);

    assert_eq!(logs.clear(env.feed_id()).await.unwrap(), 3);
    assert!(logs.list(env.feed_id(), None).await.unwrap().is_empty());
}
