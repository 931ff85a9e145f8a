// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::localdb::{format_timestamp, parse_timestamp};
use crate::types::{SyncCounts, SyncOutcome};

/// Per-feed history of sync runs, newest first.
#[derive(Debug, Clone)]
pub struct SyncLogs {
    pool: SqlitePool,
}

impl SyncLogs {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends an entry and prunes the feed's history down to `retention` entries.
    ///
    /// Never fails: storage errors are reported through tracing only.
    /// A `retention` of zero keeps everything.
    pub async fn record(&self, feed_id: &str, outcome: &SyncOutcome, retention: u32) {
        match self.insert(feed_id, outcome).await {
            Ok(id) => tracing::trace!(feed_id, id, "sync log written"),
            Err(err) => {
                tracing::error!(feed_id, %err, "failed to write sync log");
                return;
            }
        }

        if retention > 0
            && let Err(err) = self.prune(feed_id, retention).await
        {
            tracing::warn!(feed_id, %err, "failed to prune sync log");
        }
    }

    async fn insert(&self, feed_id: &str, outcome: &SyncOutcome) -> Result<i64, sqlx::Error> {
        const SQL: &str = "\
INSERT INTO sync_logs (feed_id, status, message, created, updated, deleted, total_seen, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?);
";

        let (status, message, counts) = match outcome {
            SyncOutcome::Success(counts) => (SyncStatus::Success, counts.to_string(), Some(counts)),
            SyncOutcome::Error(message) => (SyncStatus::Error, message.clone(), None),
        };
        let count = |f: fn(&SyncCounts) -> u64| counts.map(|c| saturating_i64(f(c)));

        let result = sqlx::query(SQL)
            .bind(feed_id)
            .bind(status.as_str())
            .bind(message)
            .bind(count(|c| c.created))
            .bind(count(|c| c.updated))
            .bind(count(|c| c.deleted))
            .bind(count(|c| c.total_seen))
            .bind(format_timestamp(Timestamp::now()))
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    async fn prune(&self, feed_id: &str, retention: u32) -> Result<u64, sqlx::Error> {
        const SQL: &str = "\
DELETE FROM sync_logs
WHERE feed_id = ?
  AND id NOT IN (
    SELECT id FROM sync_logs WHERE feed_id = ? ORDER BY id DESC LIMIT ?
  );
";

        let result = sqlx::query(SQL)
            .bind(feed_id)
            .bind(feed_id)
            .bind(i64::from(retention))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Lists entries for a feed, newest first. `None` lists everything.
    pub async fn list(
        &self,
        feed_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<SyncLogRecord>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, feed_id, status, message, created, updated, deleted, total_seen, is_read, created_at
FROM sync_logs
WHERE feed_id = ?
ORDER BY id DESC
LIMIT ?;
";

        // a negative limit means no limit in sqlite
        let limit = limit.map_or(-1, i64::from);
        sqlx::query_as(SQL)
            .bind(feed_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    /// Marks every error entry of a feed as read.
    pub async fn mark_errors_read(&self, feed_id: &str) -> Result<u64, sqlx::Error> {
        const SQL: &str = "\
UPDATE sync_logs
SET is_read = 1
WHERE feed_id = ? AND status = 'error' AND is_read = 0;
";

        let result = sqlx::query(SQL).bind(feed_id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn unread_error_count(&self, feed_id: &str) -> Result<i64, sqlx::Error> {
        const SQL: &str = "\
SELECT COUNT(*)
FROM sync_logs
WHERE feed_id = ? AND status = 'error' AND is_read = 0;
";

        sqlx::query_scalar(SQL)
            .bind(feed_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Removes the whole history of a feed.
    pub async fn clear(&self, feed_id: &str) -> Result<u64, sqlx::Error> {
        const SQL: &str = "DELETE FROM sync_logs WHERE feed_id = ?;";

        let result = sqlx::query(SQL).bind(feed_id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn saturating_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(SyncStatus::Success),
            "error" => Ok(SyncStatus::Error),
            _ => Err(format!("Invalid sync status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SyncLogRecord {
    id: i64,
    feed_id: String,
    status: String,
    message: String,
    created: Option<i64>,
    updated: Option<i64>,
    deleted: Option<i64>,
    total_seen: Option<i64>,
    is_read: bool,
    created_at: String,
}

impl SyncLogRecord {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn feed_id(&self) -> &str {
        &self.feed_id
    }

    /// The run status. Rows are constrained to the two known values.
    pub fn status(&self) -> SyncStatus {
        self.status.parse().unwrap_or(SyncStatus::Error)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Counts of a successful run; `None` for errors.
    pub fn counts(&self) -> Option<SyncCounts> {
        let to_u64 = |n: Option<i64>| n.and_then(|n| u64::try_from(n).ok());
        Some(SyncCounts {
            created: to_u64(self.created)?,
            updated: to_u64(self.updated)?,
            deleted: to_u64(self.deleted)?,
            unchanged: 0,
            total_seen: to_u64(self.total_seen)?,
        })
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        parse_timestamp(&self.created_at)
    }
}
