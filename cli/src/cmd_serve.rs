// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use shiftsync_core::ShiftSync;
use tokio::signal;

#[derive(Debug, Clone, Copy)]
pub struct CmdServe;

impl CmdServe {
    pub const NAME: &str = "serve";

    pub fn command() -> Command {
        Command::new(Self::NAME).about(
            "Run the scheduler until interrupted, printing one JSON line per changed calendar",
        )
    }

    pub fn from(_matches: &ArgMatches) -> Self {
        Self
    }

    pub async fn run(self, app: &mut ShiftSync) -> Result<(), Box<dyn Error>> {
        let mut changes = app
            .take_changes()
            .ok_or("change notifications are already consumed")?;

        let handle = app.start_scheduler();

        let result = loop {
            tokio::select! {
                res = signal::ctrl_c() => break res.map_err(Box::<dyn Error + Send + Sync>::from),
                Some(change) = changes.recv() => {
                    tracing::debug!(calendar_id = %change.calendar_id, "calendar changed");
                    match serde_json::to_string(&change) {
                        Ok(line) => println!("{line}"),
                        Err(err) => break Err(err.into()),
                    }
                }
            }
        };

        tracing::debug!("shutdown requested");
        handle.stop().await;
        result.map_err(|e| e as Box<dyn Error>)
    }
}
