// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::{SignedDuration, Timestamp};
use sqlx::{SqliteConnection, SqlitePool};

use crate::localdb::{format_timestamp, new_id, parse_timestamp};

#[derive(Debug, Clone)]
pub struct Feeds {
    pool: SqlitePool,
}

impl Feeds {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, feed: &FeedRecord) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
INSERT INTO external_feeds (id, calendar_id, name, url, color, sync_interval_minutes, last_synced_at, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?);
";

        sqlx::query(SQL)
            .bind(&feed.id)
            .bind(&feed.calendar_id)
            .bind(&feed.name)
            .bind(&feed.url)
            .bind(&feed.color)
            .bind(feed.sync_interval_minutes)
            .bind(&feed.last_synced_at)
            .bind(&feed.created_at)
            .bind(&feed.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Writes the user-editable columns of `feed`. Returns `false` if the feed is gone.
    pub async fn update(&self, feed: &FeedRecord) -> Result<bool, sqlx::Error> {
        const SQL: &str = "\
UPDATE external_feeds
SET name = ?, url = ?, color = ?, sync_interval_minutes = ?, updated_at = ?
WHERE id = ?;
";

        let result = sqlx::query(SQL)
            .bind(&feed.name)
            .bind(&feed.url)
            .bind(&feed.color)
            .bind(feed.sync_interval_minutes)
            .bind(&feed.updated_at)
            .bind(&feed.id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, id: &str) -> Result<Option<FeedRecord>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, calendar_id, name, url, color, sync_interval_minutes, last_synced_at, created_at, updated_at
FROM external_feeds
WHERE id = ?;
";

        sqlx::query_as(SQL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list(&self) -> Result<Vec<FeedRecord>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, calendar_id, name, url, color, sync_interval_minutes, last_synced_at, created_at, updated_at
FROM external_feeds
ORDER BY created_at, id;
";

        sqlx::query_as(SQL).fetch_all(&self.pool).await
    }

    pub async fn list_by_calendar(&self, calendar_id: &str) -> Result<Vec<FeedRecord>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, calendar_id, name, url, color, sync_interval_minutes, last_synced_at, created_at, updated_at
FROM external_feeds
WHERE calendar_id = ?
ORDER BY created_at, id;
";

        sqlx::query_as(SQL)
            .bind(calendar_id)
            .fetch_all(&self.pool)
            .await
    }

    /// Deletes a feed. Its shifts and log entries go with it.
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        const SQL: &str = "DELETE FROM external_feeds WHERE id = ?;";

        let result = sqlx::query(SQL).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Records a successful sync inside the caller's transaction.
    pub(crate) async fn stamp_synced(
        conn: &mut SqliteConnection,
        id: &str,
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        const SQL: &str = "UPDATE external_feeds SET last_synced_at = ? WHERE id = ?;";

        sqlx::query(SQL)
            .bind(format_timestamp(at))
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FeedRecord {
    id: String,
    calendar_id: String,
    name: String,
    url: String,
    color: String,
    sync_interval_minutes: i64,
    last_synced_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl FeedRecord {
    /// A feed that has never been synced.
    pub fn new(
        calendar_id: &str,
        name: &str,
        url: &str,
        color: &str,
        sync_interval_minutes: u32,
    ) -> Self {
        let now = format_timestamp(Timestamp::now());
        Self {
            id: new_id(),
            calendar_id: calendar_id.to_string(),
            name: name.to_string(),
            url: url.to_string(),
            color: color.to_string(),
            sync_interval_minutes: i64::from(sync_interval_minutes),
            last_synced_at: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn sync_interval_minutes(&self) -> i64 {
        self.sync_interval_minutes
    }

    pub fn last_synced_at(&self) -> Option<Timestamp> {
        self.last_synced_at.as_deref().and_then(parse_timestamp)
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        parse_timestamp(&self.created_at)
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        parse_timestamp(&self.updated_at)
    }

    /// Whether the feed should be synced at `now`.
    ///
    /// A feed that was never synced is always due.
    pub fn is_due(&self, now: Timestamp) -> bool {
        match self.last_synced_at() {
            None => true,
            Some(last) => {
                now.duration_since(last) >= SignedDuration::from_mins(self.sync_interval_minutes)
            }
        }
    }

    /// Applies a patch, bumping `updated_at`. The URL must already be validated.
    pub(crate) fn apply(&mut self, patch: FeedPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(url) = patch.url {
            self.url = url;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(interval) = patch.sync_interval_minutes {
            self.sync_interval_minutes = i64::from(interval);
        }
        self.updated_at = format_timestamp(Timestamp::now());
    }

    #[cfg(test)]
    pub(crate) fn with_last_synced_at(mut self, at: Timestamp) -> Self {
        self.last_synced_at = Some(format_timestamp(at));
        self
    }
}

/// User edits to a feed. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub color: Option<String>,
    pub sync_interval_minutes: Option<u32>,
}

impl FeedPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.url.is_none()
            && self.color.is_none()
            && self.sync_interval_minutes.is_none()
    }
}
