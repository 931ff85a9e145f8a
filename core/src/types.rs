// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::Serialize;

/// What a successful sync changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCounts {
    /// Shifts inserted for events not seen before.
    pub created: u64,

    /// Synced shifts whose content changed.
    pub updated: u64,

    /// Synced shifts whose event left the feed.
    pub deleted: u64,

    /// Synced shifts that matched their event exactly.
    pub unchanged: u64,

    /// Distinct events read from the feed.
    pub total_seen: u64,
}

impl SyncCounts {
    /// Whether the calendar changed at all.
    pub fn is_empty(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.deleted == 0
    }
}

impl fmt::Display for SyncCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} deleted",
            self.created, self.updated, self.deleted
        )
    }
}

/// The result of one sync run as it is written to the sync log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Success(SyncCounts),
    Error(String),
}
