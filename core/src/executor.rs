// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Transactional application of a sync plan.

use std::time::Duration;

use jiff::Timestamp;

use crate::error::SyncError;
use crate::localdb::{FeedRecord, Feeds, LocalDb, Shifts};
use crate::notify::{CalendarChange, ChangeBus};
use crate::reconcile::{ShiftDraft, SyncPlan, reconcile};
use crate::types::SyncCounts;

/// Applies parsed drafts of one feed to storage.
#[derive(Debug, Clone)]
pub struct Executor {
    db: LocalDb,
    bus: Option<ChangeBus>,
    storage_timeout: Duration,
}

impl Executor {
    pub fn new(db: LocalDb, bus: Option<ChangeBus>, storage_timeout: Duration) -> Self {
        Self {
            db,
            bus,
            storage_timeout,
        }
    }

    /// Reconciles `drafts` against the feed's stored shifts and writes the result.
    ///
    /// Inserts, updates, deletes and the `last_synced_at` stamp commit together or
    /// not at all. The whole transaction is bounded by the storage timeout; when it
    /// expires the transaction is dropped and rolled back.
    pub async fn execute(
        &self,
        feed: &FeedRecord,
        drafts: Vec<ShiftDraft>,
        now: Timestamp,
    ) -> Result<SyncCounts, SyncError> {
        let counts = tokio::time::timeout(self.storage_timeout, self.apply(feed, drafts, now))
            .await
            .map_err(|_| SyncError::StorageTimeout)??;

        if let Some(bus) = &self.bus {
            bus.publish(CalendarChange {
                calendar_id: feed.calendar_id().to_string(),
            });
        }
        Ok(counts)
    }

    async fn apply(
        &self,
        feed: &FeedRecord,
        drafts: Vec<ShiftDraft>,
        now: Timestamp,
    ) -> Result<SyncCounts, SyncError> {
        let mut tx = self.db.begin().await?;

        let existing = Shifts::synced_for_feed(&mut tx, feed.id()).await?;
        let plan = reconcile(&existing, drafts);
        tracing::debug!(
            feed_id = feed.id(),
            inserts = plan.to_insert.len(),
            updates = plan.to_update.len(),
            deletes = plan.to_delete.len(),
            "applying sync plan"
        );

        let counts = counts_of(&plan);
        let SyncPlan {
            to_insert,
            to_update,
            to_delete,
            ..
        } = plan;

        for draft in &to_insert {
            Shifts::insert_synced(
                &mut tx,
                feed.calendar_id(),
                feed.id(),
                &draft.external_id,
                &draft.content,
                now,
            )
            .await?;
        }
        for update in &to_update {
            Shifts::overwrite_synced(&mut tx, &update.id, &update.draft.content, now).await?;
        }
        for id in &to_delete {
            Shifts::delete_synced(&mut tx, id).await?;
        }
        Feeds::stamp_synced(&mut tx, feed.id(), now).await?;

        tx.commit().await?;
        Ok(counts)
    }
}

fn counts_of(plan: &SyncPlan) -> SyncCounts {
    SyncCounts {
        created: plan.to_insert.len() as u64,
        updated: plan.to_update.len() as u64,
        deleted: plan.to_delete.len() as u64,
        unchanged: plan.unchanged,
        total_seen: plan.total_seen,
    }
}
