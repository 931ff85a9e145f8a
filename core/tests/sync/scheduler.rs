// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use jiff::{Timestamp, ToSpan};
use shiftsync_core::localdb::SyncStatus;
use shiftsync_core::{NewFeed, Scheduler};
use tokio::task::JoinSet;

use crate::common::{GatedSource, IcsBuilder, ScriptedSource, test_env};

fn feed() -> String {
    IcsBuilder::new()
        .event("A", "Early", "20250110T060000Z", "20250110T140000Z")
        .build()
}

async fn drain(runs: &mut JoinSet<()>) {
    while let Some(joined) = runs.join_next().await {
        joined.unwrap();
    }
}

#[tokio::test]
async fn tick_runs_due_feeds_only() {
    // Arrange
    let source = Arc::new(ScriptedSource::new(feed()));
    let env = test_env(source.clone()).await;
    let mut runs = JoinSet::new();

    // Act & Assert: never synced, so due immediately
    let started = Scheduler::tick(&env.engine, &mut runs, Timestamp::now()).await;
    assert_eq!(started, vec![env.feed_id().to_string()]);
    drain(&mut runs).await;
    assert_eq!(source.calls(), 1);

    // synced just now, interval is an hour
    let started = Scheduler::tick(&env.engine, &mut runs, Timestamp::now()).await;
    assert!(started.is_empty());

    // an hour later it is due again
    let later = Timestamp::now() + 61.minutes();
    let started = Scheduler::tick(&env.engine, &mut runs, later).await;
    assert_eq!(started.len(), 1);
    drain(&mut runs).await;
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn tick_skips_feed_still_running() {
    // Arrange
    let source = Arc::new(GatedSource::new(feed()));
    let env = test_env(source.clone()).await;
    let mut runs = JoinSet::new();
    let started = Scheduler::tick(&env.engine, &mut runs, Timestamp::now()).await;
    assert_eq!(started.len(), 1);
    source.entered().await;

    // Act
    let later = Timestamp::now() + 2.hours();
    let skipped = Scheduler::tick(&env.engine, &mut runs, later).await;

    // Assert
    assert!(skipped.is_empty(), "a running feed must not be queued again");
    source.release();
    drain(&mut runs).await;
    let entries = env.db().sync_logs.list(env.feed_id(), None).await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn tick_isolates_failing_feeds() {
    // Arrange
    let source = Arc::new(ScriptedSource::new(feed()));
    let env = test_env(source.clone()).await;
    let other = env
        .engine
        .create_feed(NewFeed {
            calendar_id: env.calendar_id.clone(),
            name: "Broken".to_string(),
            url: "https://p02-caldav.icloud.com/published/broken".to_string(),
            color: None,
            sync_interval_minutes: Some(5),
        })
        .await
        .unwrap();
    source.fail_with_status(500);
    let mut runs = JoinSet::new();

    // Act
    let started = Scheduler::tick(&env.engine, &mut runs, Timestamp::now()).await;
    drain(&mut runs).await;

    // Assert: both ran, both failed, and neither was stamped so both retry next tick
    assert_eq!(started.len(), 2);
    for feed_id in [env.feed_id(), other.id()] {
        let entries = env.db().sync_logs.list(feed_id, None).await.unwrap();
        assert_eq!(entries[0].status(), SyncStatus::Error);
        assert_eq!(entries[0].message(), "unexpected HTTP status 500");
    }
    let retried = Scheduler::tick(&env.engine, &mut runs, Timestamp::now()).await;
    assert_eq!(retried.len(), 2);
    drain(&mut runs).await;
}

#[tokio::test]
async fn scheduler_start_and_stop() {
    // Arrange
    let source = Arc::new(ScriptedSource::new(feed()));
    let env = test_env(source.clone()).await;

    // Act
    let handle = Scheduler::start(env.engine.clone(), Duration::from_millis(20));
    let mut synced = false;
    for _ in 0..250 {
        if env.reload_feed().await.last_synced_at().is_some() {
            synced = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    handle.stop().await;

    // Assert
    assert!(synced, "the first tick should sync the feed");
    assert_eq!(source.calls(), 1, "the feed is not due again within its interval");
    assert_eq!(env.external_ids().await, vec!["A"]);
}
