// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Test data factories for integration tests.

use std::sync::Arc;
use std::time::Duration;

use jiff::tz::TimeZone;
use shiftsync_core::localdb::FeedRecord;
use shiftsync_core::{
    CalendarChange, ChangeBus, EngineOptions, LocalDb, NewFeed, SyncEngine,
};
use shiftsync_feed::{FeedSource, UrlPolicy};
use tokio::sync::mpsc::Receiver;

/// Builds small iCalendar documents.
#[derive(Debug, Default)]
pub struct IcsBuilder {
    events: Vec<String>,
}

#[allow(dead_code)]
impl IcsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A timed event; `start` and `end` are UTC stamps like `20250110T080000Z`.
    pub fn event(mut self, uid: &str, summary: &str, start: &str, end: &str) -> Self {
        self.events.push(format!(
            "BEGIN:VEVENT\nUID:{uid}\nDTSTART:{start}\nDTEND:{end}\nSUMMARY:{summary}\nEND:VEVENT\n"
        ));
        self
    }

    /// An all-day event on `date` like `20250110`.
    pub fn all_day(mut self, uid: &str, summary: &str, date: &str) -> Self {
        self.events.push(format!(
            "BEGIN:VEVENT\nUID:{uid}\nDTSTART;VALUE=DATE:{date}\nSUMMARY:{summary}\nEND:VEVENT\n"
        ));
        self
    }

    pub fn build(&self) -> String {
        format!(
            "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//shiftsync tests//EN\n{}END:VCALENDAR\n",
            self.events.concat()
        )
    }
}

/// An engine over an in-memory database holding one calendar and one feed.
#[derive(Debug)]
#[allow(dead_code)]
pub struct TestEnv {
    pub engine: SyncEngine,
    pub calendar_id: String,
    pub feed: FeedRecord,
    pub changes: Receiver<CalendarChange>,
}

#[allow(dead_code)]
impl TestEnv {
    pub fn db(&self) -> &LocalDb {
        self.engine.db()
    }

    pub fn feed_id(&self) -> &str {
        self.feed.id()
    }

    /// External ids of the feed's stored shifts, sorted.
    pub async fn external_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .db()
            .shifts
            .list_by_feed(self.feed_id())
            .await
            .unwrap()
            .iter()
            .filter_map(|s| s.external_id().map(str::to_string))
            .collect();
        ids.sort();
        ids
    }

    pub async fn reload_feed(&self) -> FeedRecord {
        self.db()
            .feeds
            .get(self.feed_id())
            .await
            .unwrap()
            .expect("feed should exist")
    }
}

/// Options used by every test engine: UTC, default allow-list, short storage timeout.
pub fn test_options(policy: UrlPolicy) -> EngineOptions {
    EngineOptions {
        timezone: TimeZone::UTC,
        policy,
        storage_timeout: Duration::from_secs(5),
        log_retention: 100,
        default_interval_minutes: 60,
    }
}

pub async fn test_env(source: Arc<dyn FeedSource>) -> TestEnv {
    test_env_with(
        source,
        UrlPolicy::default(),
        "https://p01-caldav.icloud.com/published/2/rota",
    )
    .await
}

pub async fn test_env_with(source: Arc<dyn FeedSource>, policy: UrlPolicy, url: &str) -> TestEnv {
    let db = LocalDb::open(None, Duration::from_secs(5))
        .await
        .expect("Failed to create test database");
    let (bus, changes) = ChangeBus::new(16);
    let engine = SyncEngine::new(db, source, Some(bus), test_options(policy));

    let calendar = engine.db().calendars.insert("Work").await.unwrap();
    let feed = engine
        .create_feed(NewFeed {
            calendar_id: calendar.id().to_string(),
            name: "Hospital rota".to_string(),
            url: url.to_string(),
            color: Some("#10b981".to_string()),
            sync_interval_minutes: Some(60),
        })
        .await
        .expect("Failed to create test feed");

    TestEnv {
        engine,
        calendar_id: calendar.id().to_string(),
        feed,
        changes,
    }
}
