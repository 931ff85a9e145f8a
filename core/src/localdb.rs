// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

mod calendars;
mod feeds;
mod shifts;
mod sync_logs;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use jiff::Timestamp;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

pub use crate::localdb::calendars::{CalendarRecord, Calendars};
pub use crate::localdb::feeds::{FeedPatch, FeedRecord, Feeds};
pub use crate::localdb::shifts::{ShiftContent, ShiftRecord, Shifts};
pub use crate::localdb::sync_logs::{SyncLogRecord, SyncLogs, SyncStatus};

/// Distinguishes in-memory databases opened by the same process.
pub(crate) static IN_MEMORY_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Local storage shared by the sync subsystem and the rest of the application.
#[derive(Debug, Clone)]
pub struct LocalDb {
    pool: SqlitePool,

    pub calendars: Calendars,
    pub feeds: Feeds,
    pub shifts: Shifts,
    pub sync_logs: SyncLogs,
}

impl LocalDb {
    /// Opens a sqlite database connection.
    /// If `filename` is `None`, it opens an in-memory database.
    ///
    /// `acquire_timeout` bounds how long any storage operation waits for a connection.
    pub async fn open(
        filename: Option<&Path>,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool_options = SqlitePoolOptions::new().acquire_timeout(acquire_timeout);
        let pool = if let Some(filename) = filename {
            tracing::info!(path = %filename.display(), "connecting to SQLite database");
            let options = SqliteConnectOptions::new()
                .filename(filename)
                .create_if_missing(true)
                .foreign_keys(true)
                .busy_timeout(acquire_timeout);
            pool_options.connect_with(options).await?
        } else {
            tracing::info!("connecting to in-memory SQLite database");
            let db_id = IN_MEMORY_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
            let options = SqliteConnectOptions::new()
                .filename(format!("file:shiftsync_memdb_{db_id}?mode=memory&cache=shared"))
                .in_memory(true)
                .foreign_keys(true);
            // a single connection that is never recycled keeps the database alive
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("src/localdb/migrations") // relative path from the crate root
            .run(&pool)
            .await?;

        tracing::debug!("database ready");
        Ok(LocalDb {
            calendars: Calendars::new(pool.clone()),
            feeds: Feeds::new(pool.clone()),
            shifts: Shifts::new(pool.clone()),
            sync_logs: SyncLogs::new(pool.clone()),
            pool,
        })
    }

    /// Starts a write transaction on the underlying pool.
    ///
    /// The write lock is taken up front so concurrent writers wait on the busy
    /// timeout instead of failing when a read lock cannot be upgraded.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin_with("BEGIN IMMEDIATE").await
    }

    pub async fn close(self) {
        tracing::debug!("closing database connection");
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(crate) fn format_timestamp(ts: Timestamp) -> String {
    ts.to_string()
}

pub(crate) fn parse_timestamp(s: &str) -> Option<Timestamp> {
    s.parse().ok()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
