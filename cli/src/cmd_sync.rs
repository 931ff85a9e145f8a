// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use colored::Colorize;
use shiftsync_core::ShiftSync;

use crate::arg::{CommonArgs, FeedArgs};
use crate::util::OutputFormat;

#[derive(Debug, Clone)]
pub struct CmdSync {
    pub id: String,
    pub output_format: OutputFormat,
}

impl CmdSync {
    pub const NAME: &str = "sync";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Sync a feed now, regardless of its interval")
            .arg(FeedArgs::id())
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            id: FeedArgs::get_id(matches)?,
            output_format: CommonArgs::get_output_format(matches),
        })
    }

    #[tracing::instrument(skip(app))]
    pub async fn run(self, app: &mut ShiftSync) -> Result<(), Box<dyn Error>> {
        let counts = app.engine().run_sync(&self.id).await?;
        match self.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&counts)?),
            OutputFormat::Table => {
                let status = if counts.is_empty() {
                    "Up to date".normal()
                } else {
                    "Synced".green()
                };
                println!("{} {}: {counts}", status, self.id);
            }
        }
        Ok(())
    }
}
