// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Timestamp;
use sqlx::SqlitePool;

use crate::localdb::{format_timestamp, new_id, parse_timestamp};

#[derive(Debug, Clone)]
pub struct Calendars {
    pool: SqlitePool,
}

impl Calendars {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, name: &str) -> Result<CalendarRecord, sqlx::Error> {
        const SQL: &str = "\
INSERT INTO calendars (id, name, created_at)
VALUES (?, ?, ?);
";

        let record = CalendarRecord {
            id: new_id(),
            name: name.to_string(),
            created_at: format_timestamp(Timestamp::now()),
        };
        sqlx::query(SQL)
            .bind(&record.id)
            .bind(&record.name)
            .bind(&record.created_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(id = %record.id, "calendar created");
        Ok(record)
    }

    pub async fn get(&self, id: &str) -> Result<Option<CalendarRecord>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, name, created_at
FROM calendars
WHERE id = ?;
";

        sqlx::query_as(SQL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list(&self) -> Result<Vec<CalendarRecord>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, name, created_at
FROM calendars
ORDER BY created_at, id;
";

        sqlx::query_as(SQL).fetch_all(&self.pool).await
    }

    /// Deletes a calendar with all of its feeds, shifts and logs.
    pub async fn delete(&self, id: &str) -> Result<bool, sqlx::Error> {
        const SQL: &str = "DELETE FROM calendars WHERE id = ?;";

        let result = sqlx::query(SQL).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CalendarRecord {
    id: String,
    name: String,
    created_at: String,
}

impl CalendarRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> Option<Timestamp> {
        parse_timestamp(&self.created_at)
    }
}
