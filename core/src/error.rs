// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use shiftsync_feed::{FetchError, InvalidSourceUrl, ParseError};
use thiserror::Error;

use crate::config::ConfigError;

/// Failures while bringing up the application.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Failed to prepare state directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to initialize db: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Failed to build feed fetcher: {0}")]
    Fetcher(#[from] FetchError),
}

/// Failures of feed management and sync runs.
///
/// The display text of a failed run is what lands in the sync log.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Rejected at creation or edit time.
    #[error("invalid source URL: {0}")]
    InvalidSourceUrl(#[from] InvalidSourceUrl),

    #[error("sync interval must be at least 1 minute")]
    InvalidInterval,

    #[error("{0}")]
    FetchFailed(#[from] FetchError),

    #[error("parse failed: {0}")]
    ParseFailed(#[from] ParseError),

    #[error("storage failed: {0}")]
    StorageFailed(#[from] sqlx::Error),

    #[error("storage timeout")]
    StorageTimeout,

    #[error("feed not found: {0}")]
    FeedNotFound(String),

    #[error("calendar not found: {0}")]
    CalendarNotFound(String),

    /// A run for the same feed is already in flight. Not written to the sync log.
    #[error("sync already running for feed {0}")]
    ConcurrentRunSkipped(String),
}

impl SyncError {
    /// Whether the failure is recorded in the sync log.
    pub fn is_logged(&self) -> bool {
        !matches!(
            self,
            SyncError::ConcurrentRunSkipped(_) | SyncError::FeedNotFound(_)
        )
    }
}
