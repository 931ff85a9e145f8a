// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Planning of a feed sync: joins parsed events against the feed's stored shifts.

use std::collections::HashMap;

use shiftsync_feed::ExternalEvent;

use crate::localdb::{ShiftContent, ShiftRecord};

/// A parsed event ready to be stored as a synced shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftDraft {
    pub external_id: String,
    pub content: ShiftContent,
}

impl ShiftDraft {
    /// Builds a draft, falling back to the feed color when the event has none.
    pub fn from_event(event: ExternalEvent, feed_color: &str) -> Self {
        let color = event.color.unwrap_or_else(|| feed_color.to_string());
        Self {
            external_id: event.uid,
            content: ShiftContent {
                date: event.date,
                start_time: event.start_time,
                end_time: event.end_time,
                all_day: event.all_day,
                title: event.title,
                description: event.description,
                color: Some(color),
            },
        }
    }
}

/// An existing synced shift to overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    pub id: String,
    pub draft: ShiftDraft,
}

/// The writes needed to make a feed's stored shifts match its document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub to_insert: Vec<ShiftDraft>,
    pub to_update: Vec<PlannedUpdate>,
    /// Ids of stored shifts to remove.
    pub to_delete: Vec<String>,
    pub unchanged: u64,
    /// Distinct external ids in the document.
    pub total_seen: u64,
}

impl SyncPlan {
    pub fn is_noop(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Computes the plan for one feed.
///
/// `existing` must hold the synced shifts of that feed only. Remote wins: every
/// stored field is overwritten when anything differs.
pub fn reconcile(existing: &[ShiftRecord], incoming: Vec<ShiftDraft>) -> SyncPlan {
    let incoming = dedupe_last_wins(incoming);
    let mut plan = SyncPlan {
        total_seen: incoming.len() as u64,
        ..Default::default()
    };

    let mut stored: HashMap<&str, &ShiftRecord> = HashMap::with_capacity(existing.len());
    for record in existing {
        let Some(external_id) = record.external_id() else {
            continue;
        };
        if stored.contains_key(external_id) {
            tracing::warn!(external_id, id = record.id(), "duplicate synced shift");
            plan.to_delete.push(record.id().to_string());
        } else {
            stored.insert(external_id, record);
        }
    }

    for draft in incoming {
        match stored.remove(draft.external_id.as_str()) {
            None => plan.to_insert.push(draft),
            Some(record) if record.has_content(&draft.content) => plan.unchanged += 1,
            Some(record) => plan.to_update.push(PlannedUpdate {
                id: record.id().to_string(),
                draft,
            }),
        }
    }

    // whatever was not claimed by an incoming event has left the feed
    let mut gone: Vec<&ShiftRecord> = stored.into_values().collect();
    gone.sort_by(|a, b| a.id().cmp(b.id()));
    plan.to_delete.extend(gone.into_iter().map(|r| r.id().to_string()));

    plan
}

fn dedupe_last_wins(drafts: Vec<ShiftDraft>) -> Vec<ShiftDraft> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(drafts.len());
    let mut out: Vec<ShiftDraft> = Vec::with_capacity(drafts.len());
    for draft in drafts {
        if let Some(&i) = positions.get(&draft.external_id) {
            tracing::debug!(external_id = %draft.external_id, "duplicate UID in feed, keeping the last");
            out[i] = draft;
        } else {
            positions.insert(draft.external_id.clone(), out.len());
            out.push(draft);
        }
    }
    out
}
