// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command, arg, value_parser};
use colored::{Color, Colorize};
use jiff::{Timestamp, tz::TimeZone};
use serde::Serialize;
use shiftsync_core::localdb::{SyncLogRecord, SyncStatus};
use shiftsync_core::{ShiftSync, SyncCounts};

use crate::arg::{CommonArgs, FeedArgs};
use crate::cmd_feed::require_feed;
use crate::table::Column;
use crate::util::{OutputFormat, format_timestamp};

#[derive(Debug, Clone)]
pub struct CmdLogList {
    pub id: String,
    pub limit: Option<u32>,
    pub output_format: OutputFormat,
}

impl CmdLogList {
    pub const NAME: &str = "list";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Show the sync history of a feed, newest first")
            .arg(FeedArgs::id())
            .arg(
                arg!(-n --limit <N> "Show at most N entries")
                    .required(false)
                    .value_parser(value_parser!(u32)),
            )
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            id: FeedArgs::get_id(matches)?,
            limit: matches.get_one("limit").copied(),
            output_format: CommonArgs::get_output_format(matches),
        })
    }

    #[tracing::instrument(skip(app))]
    pub async fn run(self, app: &mut ShiftSync) -> Result<(), Box<dyn Error>> {
        require_feed(app.db(), &self.id).await?;
        let logs = app.db().sync_logs.list(&self.id, self.limit).await?;

        let tz = app.engine().options().timezone.clone();
        let columns = [
            LogColumn::Time(tz),
            LogColumn::Status,
            LogColumn::Message,
        ];
        self.output_format
            .print(&columns, &logs, |log| LogView::from(log))
    }
}

#[derive(Debug, Clone)]
pub struct CmdLogRead {
    pub id: String,
}

impl CmdLogRead {
    pub const NAME: &str = "read";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Mark the errors of a feed as read")
            .arg(FeedArgs::id())
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            id: FeedArgs::get_id(matches)?,
        })
    }

    #[tracing::instrument(skip(app))]
    pub async fn run(self, app: &mut ShiftSync) -> Result<(), Box<dyn Error>> {
        require_feed(app.db(), &self.id).await?;
        let marked = app.db().sync_logs.mark_errors_read(&self.id).await?;
        println!("{} {marked} error(s) as read", "Marked".green());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdLogClear {
    pub id: String,
}

impl CmdLogClear {
    pub const NAME: &str = "clear";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Delete the sync history of a feed")
            .arg(FeedArgs::id())
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            id: FeedArgs::get_id(matches)?,
        })
    }

    #[tracing::instrument(skip(app))]
    pub async fn run(self, app: &mut ShiftSync) -> Result<(), Box<dyn Error>> {
        require_feed(app.db(), &self.id).await?;
        let cleared = app.db().sync_logs.clear(&self.id).await?;
        println!("{} {cleared} log entries", "Cleared".green());
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogView {
    id: i64,
    status: SyncStatus,
    message: String,
    counts: Option<SyncCounts>,
    is_read: bool,
    created_at: Option<Timestamp>,
}

impl From<&SyncLogRecord> for LogView {
    fn from(log: &SyncLogRecord) -> Self {
        Self {
            id: log.id(),
            status: log.status(),
            message: log.message().to_string(),
            counts: log.counts(),
            is_read: log.is_read(),
            created_at: log.created_at(),
        }
    }
}

enum LogColumn {
    Time(TimeZone),
    Status,
    Message,
}

impl Column<SyncLogRecord> for LogColumn {
    fn header(&self) -> &'static str {
        match self {
            LogColumn::Time(_) => "Time",
            LogColumn::Status => "Status",
            LogColumn::Message => "Message",
        }
    }

    fn format(&self, data: &SyncLogRecord) -> String {
        match self {
            LogColumn::Time(tz) => data
                .created_at()
                .map(|ts| format_timestamp(ts, tz))
                .unwrap_or_default(),
            LogColumn::Status => match data.status() {
                SyncStatus::Error if !data.is_read() => format!("{}*", data.status()),
                status => status.to_string(),
            },
            LogColumn::Message => data.message().to_string(),
        }
    }

    fn get_color(&self, data: &SyncLogRecord) -> Option<Color> {
        match (self, data.status()) {
            (LogColumn::Status, SyncStatus::Success) => Some(Color::Green),
            (LogColumn::Status, SyncStatus::Error) => Some(Color::Red),
            (LogColumn::Message, SyncStatus::Error) if data.is_read() => Some(Color::BrightBlack),
            _ => None,
        }
    }
}
