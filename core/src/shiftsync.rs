// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use shiftsync_feed::HttpFetcher;
use tokio::fs;
use tokio::sync::mpsc::Receiver;

use crate::config::Config;
use crate::error::SetupError;
use crate::localdb::LocalDb;
use crate::notify::{CalendarChange, ChangeBus};
use crate::scheduler::{Scheduler, SchedulerHandle};
use crate::sync::{EngineOptions, SyncEngine};

/// The sync application: storage, fetcher, engine and change bus wired from config.
#[derive(Debug)]
pub struct ShiftSync {
    config: Config,
    engine: SyncEngine,
    changes: Option<Receiver<CalendarChange>>,
}

impl ShiftSync {
    /// Creates a new instance with the given configuration.
    pub async fn new(mut config: Config) -> Result<Self, SetupError> {
        config.normalize()?;
        prepare(&config).await?;

        let db = LocalDb::open(
            config.database_path().as_deref(),
            config.sync.storage_timeout(),
        )
        .await?;
        let fetcher = HttpFetcher::new(&config.sync.fetch_config())?;
        let (bus, changes) = ChangeBus::new(config.sync.change_bus_capacity);
        let options = EngineOptions::from_config(&config)?;
        let engine = SyncEngine::new(db, Arc::new(fetcher), Some(bus), options);

        Ok(Self {
            config,
            engine,
            changes: Some(changes),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn db(&self) -> &LocalDb {
        self.engine.db()
    }

    /// Takes the receiving end of the change bus. Only the first call gets it.
    pub fn take_changes(&mut self) -> Option<Receiver<CalendarChange>> {
        self.changes.take()
    }

    /// Starts the background scheduler with the configured tick.
    pub fn start_scheduler(&self) -> SchedulerHandle {
        Scheduler::start(self.engine.clone(), self.config.sync.tick())
    }

    /// Closes the database.
    pub async fn close(self) {
        self.engine.db().clone().close().await;
    }
}

async fn prepare(config: &Config) -> Result<(), std::io::Error> {
    if let Some(parent) = &config.state_dir {
        tracing::debug!(path = %parent.display(), "ensuring state directory exists");
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}
