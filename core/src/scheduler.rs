// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Interval-driven background syncing with at most one run per feed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use jiff::Timestamp;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::sync::SyncEngine;

/// Lifecycle state of one feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// Per-feed run states behind a single lock.
///
/// Feeds absent from the map are idle.
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    states: Arc<Mutex<HashMap<String, RunState>>>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves a feed from idle to running. Returns `None` if a run is in flight.
    pub fn try_acquire(&self, feed_id: &str) -> Option<RunPermit> {
        let mut states = self.lock();
        if states.get(feed_id) == Some(&RunState::Running) {
            return None;
        }
        states.insert(feed_id.to_string(), RunState::Running);
        Some(RunPermit {
            guard: self.clone(),
            feed_id: feed_id.to_string(),
        })
    }

    pub fn state(&self, feed_id: &str) -> RunState {
        self.lock()
            .get(feed_id)
            .copied()
            .unwrap_or(RunState::Idle)
    }

    fn release(&self, feed_id: &str) {
        self.lock().remove(feed_id);
    }

    // the map stays consistent even if a holder panicked
    fn lock(&self) -> MutexGuard<'_, HashMap<String, RunState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof that a feed is running. Dropping it returns the feed to idle.
#[derive(Debug)]
pub struct RunPermit {
    guard: RunGuard,
    feed_id: String,
}

impl RunPermit {
    pub fn feed_id(&self) -> &str {
        &self.feed_id
    }
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.guard.release(&self.feed_id);
    }
}

/// The background sync loop.
#[derive(Debug)]
pub struct Scheduler;

impl Scheduler {
    /// Spawns the loop on the current runtime. The first tick fires immediately.
    pub fn start(engine: SyncEngine, tick: Duration) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(engine, tick, shutdown_rx));
        tracing::info!(tick_secs = tick.as_secs(), "scheduler started");
        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    /// One scheduling pass: spawns a run for every due feed that is not already running.
    ///
    /// Returns the ids of the feeds that were started.
    pub async fn tick(engine: &SyncEngine, runs: &mut JoinSet<()>, now: Timestamp) -> Vec<String> {
        let feeds = match engine.db().feeds.list().await {
            Ok(feeds) => feeds,
            Err(err) => {
                tracing::error!(%err, "failed to list feeds");
                return Vec::new();
            }
        };

        let mut started = Vec::new();
        for feed in feeds.into_iter().filter(|f| f.is_due(now)) {
            let Some(permit) = engine.guard().try_acquire(feed.id()) else {
                tracing::debug!(feed_id = feed.id(), "previous run still in flight, skipping");
                continue;
            };

            started.push(feed.id().to_string());
            let engine = engine.clone();
            runs.spawn(async move {
                // failures are already in the sync log
                let _ = engine.run_with_permit(permit).await;
            });
        }
        started
    }
}

async fn run_loop(engine: SyncEngine, tick: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut runs = JoinSet::new();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let started = Scheduler::tick(&engine, &mut runs, Timestamp::now()).await;
                if !started.is_empty() {
                    tracing::debug!(count = started.len(), "feed syncs started");
                }
            }
            Some(joined) = runs.join_next(), if !runs.is_empty() => {
                if let Err(err) = joined {
                    tracing::error!(%err, "sync task panicked");
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    tracing::info!(in_flight = runs.len(), "scheduler stopping, waiting for running syncs");
    while let Some(joined) = runs.join_next().await {
        if let Err(err) = joined {
            tracing::error!(%err, "sync task panicked");
        }
    }
}

/// Handle to a running [`Scheduler`].
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops ticking and waits for in-flight runs to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            tracing::error!(%err, "scheduler task failed");
        }
        tracing::info!("scheduler stopped");
    }
}
