// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Synchronization of external calendar feeds into local shift calendars.

mod config;
mod error;
mod executor;
pub mod localdb;
mod notify;
mod reconcile;
mod scheduler;
mod shiftsync;
mod sync;
mod types;

pub use crate::config::{APP_NAME, Config, ConfigError, SyncConfig, get_config_dir};
pub use crate::error::{SetupError, SyncError};
pub use crate::executor::Executor;
pub use crate::localdb::LocalDb;
pub use crate::notify::{CalendarChange, ChangeBus};
pub use crate::reconcile::{PlannedUpdate, ShiftDraft, SyncPlan, reconcile};
pub use crate::scheduler::{RunGuard, RunPermit, RunState, Scheduler, SchedulerHandle};
pub use crate::shiftsync::ShiftSync;
pub use crate::sync::{DEFAULT_FEED_COLOR, EngineOptions, NewFeed, SyncEngine};
pub use crate::types::{SyncCounts, SyncOutcome};
