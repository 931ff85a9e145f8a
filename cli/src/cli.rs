// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, ffi::OsString, path::PathBuf};

use clap::{ArgMatches, Command, ValueHint, arg, builder::styling, crate_version, value_parser};
use colored::Colorize;
use futures::{FutureExt, future::BoxFuture};
use shiftsync_core::{APP_NAME, ShiftSync};
use tracing_subscriber::EnvFilter;

use crate::cmd_calendar::{CmdCalendarAdd, CmdCalendarList};
use crate::cmd_feed::{CmdFeedAdd, CmdFeedEdit, CmdFeedList, CmdFeedRemove};
use crate::cmd_log::{CmdLogClear, CmdLogList, CmdLogRead};
use crate::cmd_serve::CmdServe;
use crate::cmd_shift::CmdShiftList;
use crate::cmd_sync::CmdSync;
use crate::config::parse_config;

const DEFAULT_LOG_FILTER: &str = "info";

/// Run the shiftsync command-line interface.
pub async fn run() -> Result<(), Box<dyn Error>> {
    match Cli::parse() {
        Ok(cli) => {
            if let Err(e) = cli.run().await {
                println!("{} {}", "Error:".red(), e);
            }
        }
        Err(e) => println!("{} {}", "Error:".red(), e),
    };
    Ok(())
}

/// Command-line interface
#[derive(Debug)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Option<PathBuf>,

    /// The command to execute
    pub command: Commands,
}

impl Cli {
    /// Create the command-line interface
    pub fn command() -> Command {
        const STYLES: styling::Styles = styling::Styles::styled()
            .header(styling::AnsiColor::Green.on_default().bold())
            .usage(styling::AnsiColor::Green.on_default().bold())
            .literal(styling::AnsiColor::Blue.on_default().bold())
            .placeholder(styling::AnsiColor::Cyan.on_default());

        Command::new(APP_NAME)
            .about("Import published ICS calendar feeds into shift calendars.")
            .author("Zexin Yuan <aim@yzx9.xyz>")
            .version(crate_version!())
            .styles(STYLES)
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                arg!(-c --config [CONFIG] "Path to the configuration file")
                    .long_help(
                        "\
Path to the configuration file. Defaults to $XDG_CONFIG_HOME/shiftsync/config.toml on Linux and MacOS, \
%APPDATA%/shiftsync/config.toml on Windows.",
                    )
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
            .subcommand(CmdServe::command())
            .subcommand(
                Command::new("calendar")
                    .alias("cal")
                    .about("Manage calendars")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdCalendarAdd::command())
                    .subcommand(CmdCalendarList::command()),
            )
            .subcommand(
                Command::new("feed")
                    .alias("f")
                    .about("Manage feed subscriptions")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdFeedAdd::command())
                    .subcommand(CmdFeedList::command())
                    .subcommand(CmdFeedEdit::command())
                    .subcommand(CmdFeedRemove::command()),
            )
            .subcommand(CmdSync::command())
            .subcommand(
                Command::new("log")
                    .about("Inspect and manage sync history")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdLogList::command())
                    .subcommand(CmdLogRead::command())
                    .subcommand(CmdLogClear::command()),
            )
            .subcommand(
                Command::new("shift")
                    .alias("shifts")
                    .about("Browse shifts")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdShiftList::command()),
            )
    }

    /// Parse the command-line arguments
    pub fn parse() -> Result<Self, Box<dyn Error>> {
        let commands = Self::command();
        let matches = commands.get_matches();
        Self::from(matches)
    }

    /// Parse the specified arguments
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, Box<dyn Error>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let commands = Self::command();
        let matches = commands.try_get_matches_from(args)?;
        Self::from(matches)
    }

    /// Create a CLI instance from the `ArgMatches`
    pub fn from(matches: ArgMatches) -> Result<Self, Box<dyn Error>> {
        use Commands::*;
        let command = match matches.subcommand() {
            Some((CmdServe::NAME, matches)) => Serve(CmdServe::from(matches)),
            Some(("calendar", matches)) => match matches.subcommand() {
                Some((CmdCalendarAdd::NAME, matches)) => {
                    CalendarAdd(CmdCalendarAdd::from(matches)?)
                }
                Some((CmdCalendarList::NAME, matches)) => {
                    CalendarList(CmdCalendarList::from(matches))
                }
                _ => unreachable!(),
            },
            Some(("feed", matches)) => match matches.subcommand() {
                Some((CmdFeedAdd::NAME, matches)) => FeedAdd(CmdFeedAdd::from(matches)?),
                Some((CmdFeedList::NAME, matches)) => FeedList(CmdFeedList::from(matches)),
                Some((CmdFeedEdit::NAME, matches)) => FeedEdit(CmdFeedEdit::from(matches)?),
                Some((CmdFeedRemove::NAME, matches)) => FeedRemove(CmdFeedRemove::from(matches)?),
                _ => unreachable!(),
            },
            Some((CmdSync::NAME, matches)) => Sync(CmdSync::from(matches)?),
            Some(("log", matches)) => match matches.subcommand() {
                Some((CmdLogList::NAME, matches)) => LogList(CmdLogList::from(matches)?),
                Some((CmdLogRead::NAME, matches)) => LogRead(CmdLogRead::from(matches)?),
                Some((CmdLogClear::NAME, matches)) => LogClear(CmdLogClear::from(matches)?),
                _ => unreachable!(),
            },
            Some(("shift", matches)) => match matches.subcommand() {
                Some((CmdShiftList::NAME, matches)) => ShiftList(CmdShiftList::from(matches)?),
                _ => unreachable!(),
            },
            _ => unreachable!(),
        };

        let config = matches.get_one("config").cloned();
        Ok(Cli { config, command })
    }

    /// Run the command
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        self.command.run(self.config).await
    }
}

/// The commands available in the CLI
#[derive(Debug, Clone)]
pub enum Commands {
    /// Run the scheduler in the foreground
    Serve(CmdServe),

    /// Create a calendar
    CalendarAdd(CmdCalendarAdd),

    /// List calendars
    CalendarList(CmdCalendarList),

    /// Subscribe to a feed
    FeedAdd(CmdFeedAdd),

    /// List feeds
    FeedList(CmdFeedList),

    /// Edit a feed
    FeedEdit(CmdFeedEdit),

    /// Delete a feed
    FeedRemove(CmdFeedRemove),

    /// Sync a feed now
    Sync(CmdSync),

    /// Show sync history
    LogList(CmdLogList),

    /// Mark errors as read
    LogRead(CmdLogRead),

    /// Clear sync history
    LogClear(CmdLogClear),

    /// List shifts
    ShiftList(CmdShiftList),
}

impl Commands {
    /// Run the command with the given configuration
    #[rustfmt::skip]
    pub async fn run(self, config: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
        use Commands::*;
        match self {
            Serve(a)        => Self::run_with(config, |x| a.run(x).boxed()).await,
            CalendarAdd(a)  => Self::run_with(config, |x| a.run(x).boxed()).await,
            CalendarList(a) => Self::run_with(config, |x| a.run(x).boxed()).await,
            FeedAdd(a)      => Self::run_with(config, |x| a.run(x).boxed()).await,
            FeedList(a)     => Self::run_with(config, |x| a.run(x).boxed()).await,
            FeedEdit(a)     => Self::run_with(config, |x| a.run(x).boxed()).await,
            FeedRemove(a)   => Self::run_with(config, |x| a.run(x).boxed()).await,
            Sync(a)         => Self::run_with(config, |x| a.run(x).boxed()).await,
            LogList(a)      => Self::run_with(config, |x| a.run(x).boxed()).await,
            LogRead(a)      => Self::run_with(config, |x| a.run(x).boxed()).await,
            LogClear(a)     => Self::run_with(config, |x| a.run(x).boxed()).await,
            ShiftList(a)    => Self::run_with(config, |x| a.run(x).boxed()).await,
        }
    }

    async fn run_with<F>(config: Option<PathBuf>, f: F) -> Result<(), Box<dyn Error>>
    where
        F: for<'a> FnOnce(&'a mut ShiftSync) -> BoxFuture<'a, Result<(), Box<dyn Error>>>,
    {
        let (core_config, config) = parse_config(config).await?;
        init_tracing(config.log.as_deref());

        tracing::debug!("opening database...");
        let mut app = ShiftSync::new(core_config).await?;

        let result = f(&mut app).await;

        app.close().await;
        result
    }
}

/// `RUST_LOG` wins over the configured filter, which wins over `info`.
fn init_tracing(configured: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
