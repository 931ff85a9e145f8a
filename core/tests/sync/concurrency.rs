// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use shiftsync_core::localdb::SyncStatus;
use shiftsync_core::{LocalDb, NewFeed, SyncEngine};
use shiftsync_feed::UrlPolicy;

use crate::common::{IcsBuilder, ScriptedSource, test_options};

fn rota(round: usize) -> String {
    let mut ics = IcsBuilder::new();
    for day in 10..16 {
        ics = ics.event(
            &format!("shift-{day}"),
            &format!("Round {round}"),
            &format!("202501{day}T0{}0000Z", round % 4),
            &format!("202501{day}T1{}0000Z", round % 4),
        );
    }
    ics.build()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn feeds_sharing_a_database_file_sync_concurrently() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let db = LocalDb::open(Some(&dir.path().join("shiftsync.db")), Duration::from_secs(5))
        .await
        .unwrap();
    let source = Arc::new(ScriptedSource::new(rota(0)));
    let engine = SyncEngine::new(db, source.clone(), None, test_options(UrlPolicy::default()));

    let calendar = engine.db().calendars.insert("Work").await.unwrap();
    let mut feed_ids = Vec::new();
    for name in ["ward-a", "ward-b"] {
        let feed = engine
            .create_feed(NewFeed {
                calendar_id: calendar.id().to_string(),
                name: name.to_string(),
                url: format!("https://p01-caldav.icloud.com/published/2/{name}"),
                color: None,
                sync_interval_minutes: Some(60),
            })
            .await
            .unwrap();
        feed_ids.push(feed.id().to_string());
    }

    // Act
    for round in 0..5 {
        source.set_body(rota(round));
        let (a, b) = tokio::join!(engine.run_sync(&feed_ids[0]), engine.run_sync(&feed_ids[1]));

        // Assert
        a.unwrap_or_else(|err| panic!("round {round}, first feed: {err}"));
        b.unwrap_or_else(|err| panic!("round {round}, second feed: {err}"));
    }

    for feed_id in &feed_ids {
        let shifts = engine.db().shifts.list_by_feed(feed_id).await.unwrap();
        assert_eq!(shifts.len(), 6);

        let entries = engine.db().sync_logs.list(feed_id, None).await.unwrap();
        assert_eq!(entries.len(), 5);
        assert!(entries.iter().all(|e| e.status() == SyncStatus::Success));
    }
}
