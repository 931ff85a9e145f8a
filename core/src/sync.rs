// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! The sync pipeline and feed management.

use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use jiff::tz::TimeZone;
use shiftsync_feed::{FeedSource, SourceUrl, UrlPolicy, parse_feed};

use crate::config::{Config, ConfigError};
use crate::error::SyncError;
use crate::executor::Executor;
use crate::localdb::{FeedPatch, FeedRecord, LocalDb};
use crate::notify::ChangeBus;
use crate::reconcile::ShiftDraft;
use crate::scheduler::{RunGuard, RunPermit};
use crate::types::{SyncCounts, SyncOutcome};

/// Display color for feeds created without one.
pub const DEFAULT_FEED_COLOR: &str = "#3b82f6";

/// Runtime knobs of a [`SyncEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Zone feed times are converted to.
    pub timezone: TimeZone,
    pub policy: UrlPolicy,
    pub storage_timeout: Duration,
    /// Log entries kept per feed; `0` keeps everything.
    pub log_retention: u32,
    pub default_interval_minutes: u32,
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            timezone: config.timezone()?,
            policy: config.sync.url_policy(),
            storage_timeout: config.sync.storage_timeout(),
            log_retention: config.sync.log_retention,
            default_interval_minutes: config.sync.default_interval_minutes,
        })
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timezone: TimeZone::system(),
            policy: UrlPolicy::default(),
            storage_timeout: Duration::from_secs(10),
            log_retention: 100,
            default_interval_minutes: 60,
        }
    }
}

/// A feed to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeed {
    pub calendar_id: String,
    pub name: String,
    pub url: String,
    pub color: Option<String>,
    pub sync_interval_minutes: Option<u32>,
}

/// Fetches, parses, reconciles and stores feeds.
///
/// Cheap to clone; clones share the run guard.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    db: LocalDb,
    source: Arc<dyn FeedSource>,
    executor: Executor,
    guard: RunGuard,
    options: EngineOptions,
}

impl SyncEngine {
    pub fn new(
        db: LocalDb,
        source: Arc<dyn FeedSource>,
        bus: Option<ChangeBus>,
        options: EngineOptions,
    ) -> Self {
        let executor = Executor::new(db.clone(), bus, options.storage_timeout);
        Self {
            db,
            source,
            executor,
            guard: RunGuard::new(),
            options,
        }
    }

    pub fn db(&self) -> &LocalDb {
        &self.db
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub(crate) fn guard(&self) -> &RunGuard {
        &self.guard
    }

    /// Creates a feed after checking its URL against the allow-list.
    #[tracing::instrument(skip(self, new), fields(calendar_id = %new.calendar_id))]
    pub async fn create_feed(&self, new: NewFeed) -> Result<FeedRecord, SyncError> {
        let url = self.options.policy.validate(&new.url)?;
        let interval = new
            .sync_interval_minutes
            .unwrap_or(self.options.default_interval_minutes);
        check_interval(interval)?;

        if self.db.calendars.get(&new.calendar_id).await?.is_none() {
            return Err(SyncError::CalendarNotFound(new.calendar_id));
        }

        let color = new.color.as_deref().unwrap_or(DEFAULT_FEED_COLOR);
        let feed = FeedRecord::new(&new.calendar_id, &new.name, url.as_str(), color, interval);
        self.db.feeds.insert(&feed).await?;

        tracing::info!(feed_id = feed.id(), "feed created");
        Ok(feed)
    }

    /// Edits a feed. A changed URL is validated again.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_feed(&self, feed_id: &str, patch: FeedPatch) -> Result<FeedRecord, SyncError> {
        let mut feed = self
            .db
            .feeds
            .get(feed_id)
            .await?
            .ok_or_else(|| SyncError::FeedNotFound(feed_id.to_string()))?;

        let mut patch = patch;
        if let Some(url) = &patch.url {
            patch.url = Some(self.options.policy.validate(url)?.as_str().to_string());
        }
        if let Some(interval) = patch.sync_interval_minutes {
            check_interval(interval)?;
        }
        if patch.is_empty() {
            return Ok(feed);
        }

        feed.apply(patch);
        if !self.db.feeds.update(&feed).await? {
            return Err(SyncError::FeedNotFound(feed_id.to_string()));
        }

        tracing::info!("feed updated");
        Ok(feed)
    }

    /// Deletes a feed together with its synced shifts and log entries.
    #[tracing::instrument(skip(self))]
    pub async fn delete_feed(&self, feed_id: &str) -> Result<(), SyncError> {
        if !self.db.feeds.delete(feed_id).await? {
            return Err(SyncError::FeedNotFound(feed_id.to_string()));
        }
        tracing::info!("feed deleted");
        Ok(())
    }

    /// Syncs one feed now, regardless of its interval.
    ///
    /// Fails with [`SyncError::ConcurrentRunSkipped`] when the feed is already running.
    pub async fn run_sync(&self, feed_id: &str) -> Result<SyncCounts, SyncError> {
        let permit = self
            .guard
            .try_acquire(feed_id)
            .ok_or_else(|| SyncError::ConcurrentRunSkipped(feed_id.to_string()))?;
        self.run_with_permit(permit).await
    }

    /// Runs the pipeline for the permit's feed and records the outcome.
    pub(crate) async fn run_with_permit(&self, permit: RunPermit) -> Result<SyncCounts, SyncError> {
        let feed_id = permit.feed_id();
        let result = match self.db.feeds.get(feed_id).await {
            Ok(Some(feed)) => self.pipeline(&feed).await,
            Ok(None) => Err(SyncError::FeedNotFound(feed_id.to_string())),
            Err(err) => Err(err.into()),
        };
        match &result {
            Ok(counts) => {
                tracing::info!(
                    feed_id,
                    created = counts.created,
                    updated = counts.updated,
                    deleted = counts.deleted,
                    unchanged = counts.unchanged,
                    "feed synced"
                );
                self.db
                    .sync_logs
                    .record(feed_id, &SyncOutcome::Success(*counts), self.options.log_retention)
                    .await;
            }
            Err(err) => {
                tracing::warn!(feed_id, %err, "feed sync failed");
                if err.is_logged() {
                    self.db
                        .sync_logs
                        .record(
                            feed_id,
                            &SyncOutcome::Error(err.to_string()),
                            self.options.log_retention,
                        )
                        .await;
                }
            }
        }

        drop(permit);
        result
    }

    async fn pipeline(&self, feed: &FeedRecord) -> Result<SyncCounts, SyncError> {
        // the allow-list applies when a URL is saved, not on every run
        let url = SourceUrl::from_stored(feed.url())?;
        let text = self.source.fetch(&url).await?;
        let events = parse_feed(&text, &self.options.timezone)?;
        tracing::debug!(feed_id = feed.id(), events = events.len(), "feed parsed");

        let drafts = events
            .into_iter()
            .map(|event| ShiftDraft::from_event(event, feed.color()))
            .collect();
        self.executor.execute(feed, drafts, Timestamp::now()).await
    }
}

fn check_interval(minutes: u32) -> Result<(), SyncError> {
    if minutes < 1 {
        return Err(SyncError::InvalidInterval);
    }
    Ok(())
}
