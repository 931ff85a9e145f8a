// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Change notifications for calendars touched by a sync.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};

/// A calendar's shifts changed.
///
/// Serialized as `{"type":"calendar-change","calendarId":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "calendar-change", rename_all = "camelCase")]
pub struct CalendarChange {
    pub calendar_id: String,
}

/// Bounded, non-blocking publisher of [`CalendarChange`]s.
///
/// Publishing never waits: if the consumer is slow or gone, the change is dropped.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    tx: Sender<CalendarChange>,
}

impl ChangeBus {
    /// Creates a bus and the receiving end for the transport layer.
    pub fn new(capacity: usize) -> (Self, Receiver<CalendarChange>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Publishes a change. Returns whether it was accepted.
    pub fn publish(&self, change: CalendarChange) -> bool {
        match self.tx.try_send(change) {
            Ok(()) => true,
            Err(TrySendError::Full(change)) => {
                tracing::warn!(calendar_id = %change.calendar_id, "change bus full, dropping notification");
                false
            }
            Err(TrySendError::Closed(change)) => {
                tracing::debug!(calendar_id = %change.calendar_id, "change bus closed, dropping notification");
                false
            }
        }
    }
}
