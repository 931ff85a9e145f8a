// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;
use jiff::civil::Date;
use sqlx::{SqliteConnection, SqlitePool};

use crate::localdb::{format_timestamp, new_id, parse_timestamp};

const COLUMNS: &str = "id, calendar_id, feed_id, external_id, date, start_time, end_time, all_day, title, description, color, synced, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct Shifts {
    pool: SqlitePool,
}

impl Shifts {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a user-authored shift. Sync never touches these.
    pub async fn insert_authored(
        &self,
        calendar_id: &str,
        content: &ShiftContent,
    ) -> Result<ShiftRecord, sqlx::Error> {
        let record = ShiftRecord::new(calendar_id, None, content, Timestamp::now());
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut conn, &record).await?;
        Ok(record)
    }

    pub async fn get(&self, id: &str) -> Result<Option<ShiftRecord>, sqlx::Error> {
        let sql = format!("SELECT {COLUMNS} FROM shifts WHERE id = ?;");
        sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_by_calendar(&self, calendar_id: &str) -> Result<Vec<ShiftRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM shifts WHERE calendar_id = ? ORDER BY date, start_time, id;"
        );
        sqlx::query_as(&sql)
            .bind(calendar_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn list_by_feed(&self, feed_id: &str) -> Result<Vec<ShiftRecord>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::synced_for_feed(&mut conn, feed_id).await
    }

    /// Deletes a user-authored shift. Synced shifts are owned by their feed.
    pub async fn delete_authored(&self, id: &str) -> Result<bool, sqlx::Error> {
        const SQL: &str = "DELETE FROM shifts WHERE id = ? AND synced = 0;";

        let result = sqlx::query(SQL).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub(crate) async fn synced_for_feed(
        conn: &mut SqliteConnection,
        feed_id: &str,
    ) -> Result<Vec<ShiftRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM shifts WHERE feed_id = ? AND synced = 1 ORDER BY created_at, id;"
        );
        sqlx::query_as(&sql)
            .bind(feed_id)
            .fetch_all(&mut *conn)
            .await
    }

    pub(crate) async fn insert_synced(
        conn: &mut SqliteConnection,
        calendar_id: &str,
        feed_id: &str,
        external_id: &str,
        content: &ShiftContent,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        let record = ShiftRecord::new(calendar_id, Some((feed_id, external_id)), content, now);
        Self::insert(conn, &record).await
    }

    /// Overwrites the content columns of a synced shift, keeping its id.
    pub(crate) async fn overwrite_synced(
        conn: &mut SqliteConnection,
        id: &str,
        content: &ShiftContent,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
UPDATE shifts
SET date = ?, start_time = ?, end_time = ?, all_day = ?, title = ?, description = ?, color = ?, updated_at = ?
WHERE id = ? AND synced = 1;
";

        sqlx::query(SQL)
            .bind(content.date.to_string())
            .bind(&content.start_time)
            .bind(&content.end_time)
            .bind(content.all_day)
            .bind(&content.title)
            .bind(&content.description)
            .bind(&content.color)
            .bind(format_timestamp(now))
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub(crate) async fn delete_synced(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> Result<(), sqlx::Error> {
        const SQL: &str = "DELETE FROM shifts WHERE id = ? AND synced = 1;";

        sqlx::query(SQL).bind(id).execute(&mut *conn).await?;
        Ok(())
    }

    async fn insert(conn: &mut SqliteConnection, record: &ShiftRecord) -> Result<(), sqlx::Error> {
        let sql = format!(
            "INSERT INTO shifts ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);"
        );
        sqlx::query(&sql)
            .bind(&record.id)
            .bind(&record.calendar_id)
            .bind(&record.feed_id)
            .bind(&record.external_id)
            .bind(&record.date)
            .bind(&record.start_time)
            .bind(&record.end_time)
            .bind(record.all_day)
            .bind(&record.title)
            .bind(&record.description)
            .bind(&record.color)
            .bind(record.synced)
            .bind(&record.created_at)
            .bind(&record.updated_at)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

/// The user-visible part of a shift, compared to decide whether a synced row changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftContent {
    pub date: Date,
    pub start_time: String,
    pub end_time: String,
    pub all_day: bool,
    pub title: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ShiftRecord {
    id: String,
    calendar_id: String,
    feed_id: Option<String>,
    external_id: Option<String>,
    date: String,
    start_time: String,
    end_time: String,
    all_day: bool,
    title: String,
    description: Option<String>,
    color: Option<String>,
    synced: bool,
    created_at: String,
    updated_at: String,
}

impl ShiftRecord {
    pub(crate) fn new(
        calendar_id: &str,
        provenance: Option<(&str, &str)>,
        content: &ShiftContent,
        now: Timestamp,
    ) -> Self {
        let now = format_timestamp(now);
        Self {
            id: new_id(),
            calendar_id: calendar_id.to_string(),
            feed_id: provenance.map(|(feed_id, _)| feed_id.to_string()),
            external_id: provenance.map(|(_, external_id)| external_id.to_string()),
            date: content.date.to_string(),
            start_time: content.start_time.clone(),
            end_time: content.end_time.clone(),
            all_day: content.all_day,
            title: content.title.clone(),
            description: content.description.clone(),
            color: content.color.clone(),
            synced: provenance.is_some(),
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

    pub fn feed_id(&self) -> Option<&str> {
        self.feed_id.as_deref()
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    pub fn date(&self) -> Option<Date> {
        self.date.parse().ok()
    }

    pub fn start_time(&self) -> &str {
        &self.start_time
    }

    pub fn end_time(&self) -> &str {
        &self.end_time
    }

    pub fn all_day(&self) -> bool {
        self.all_day
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn synced(&self) -> bool {
        self.synced
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        parse_timestamp(&self.created_at)
    }

    pub fn updated_at(&self) -> Option<Timestamp> {
        parse_timestamp(&self.updated_at)
    }

    /// Whether the stored row already carries `content`.
    pub fn has_content(&self, content: &ShiftContent) -> bool {
        self.date() == Some(content.date)
            && self.start_time == content.start_time
            && self.end_time == content.end_time
            && self.all_day == content.all_day
            && self.title == content.title
            && self.description == content.description
            && self.color == content.color
    }
}
