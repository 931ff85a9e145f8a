// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line front end for shiftsync.

mod arg;
mod cli;
mod cmd_calendar;
mod cmd_feed;
mod cmd_log;
mod cmd_serve;
mod cmd_shift;
mod cmd_sync;
mod config;
mod table;
mod util;

pub use crate::cli::{Cli, Commands, run};
pub use crate::config::{Config, parse_config};
pub use crate::util::OutputFormat;
