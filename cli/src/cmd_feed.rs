// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use colored::{Color, Colorize};
use jiff::{Timestamp, tz::TimeZone};
use serde::Serialize;
use shiftsync_core::localdb::{FeedPatch, FeedRecord};
use shiftsync_core::{LocalDb, NewFeed, ShiftSync, SyncError};

use crate::arg::{CommonArgs, FeedArgs};
use crate::table::{Column, PaddingDirection};
use crate::util::{OutputFormat, format_timestamp, parse_hex_color};

#[derive(Debug, Clone)]
pub struct CmdFeedAdd {
    pub calendar_id: String,
    pub name: String,
    pub url: String,
    pub color: Option<String>,
    pub interval: Option<u32>,
}

impl CmdFeedAdd {
    pub const NAME: &str = "add";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Subscribe a calendar to a published ICS feed")
            .arg(FeedArgs::calendar().required(true))
            .arg(FeedArgs::name().required(true))
            .arg(FeedArgs::url().required(true))
            .arg(FeedArgs::color())
            .arg(FeedArgs::interval())
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            calendar_id: FeedArgs::get_calendar(matches).ok_or("--calendar is required")?,
            name: FeedArgs::get_name(matches).ok_or("--name is required")?,
            url: FeedArgs::get_url(matches).ok_or("--url is required")?,
            color: FeedArgs::get_color(matches),
            interval: FeedArgs::get_interval(matches),
        })
    }

    #[tracing::instrument(skip(app))]
    pub async fn run(self, app: &mut ShiftSync) -> Result<(), Box<dyn Error>> {
        let feed = app
            .engine()
            .create_feed(NewFeed {
                calendar_id: self.calendar_id,
                name: self.name,
                url: self.url,
                color: self.color,
                sync_interval_minutes: self.interval,
            })
            .await?;

        println!(
            "{} feed {} ({}), syncing every {} min",
            "Created".green(),
            feed.name().bold(),
            feed.id(),
            feed.sync_interval_minutes()
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdFeedList {
    pub calendar_id: Option<String>,
    pub output_format: OutputFormat,
}

impl CmdFeedList {
    pub const NAME: &str = "list";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("List feeds, optionally only those of one calendar")
            .arg(FeedArgs::calendar())
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            calendar_id: FeedArgs::get_calendar(matches),
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    #[tracing::instrument(skip(app))]
    pub async fn run(self, app: &mut ShiftSync) -> Result<(), Box<dyn Error>> {
        let db = app.db();
        let feeds = match &self.calendar_id {
            Some(calendar_id) => db.feeds.list_by_calendar(calendar_id).await?,
            None => db.feeds.list().await?,
        };

        let mut rows = Vec::with_capacity(feeds.len());
        for feed in feeds {
            let unread_errors = db.sync_logs.unread_error_count(feed.id()).await?;
            rows.push(FeedRow {
                feed,
                unread_errors,
            });
        }

        let tz = app.engine().options().timezone.clone();
        let columns = [
            FeedColumn::Id,
            FeedColumn::Name,
            FeedColumn::Interval,
            FeedColumn::LastSynced(tz),
            FeedColumn::Errors,
            FeedColumn::Url,
        ];
        self.output_format
            .print(&columns, &rows, |row| FeedView::from(row))
    }
}

#[derive(Debug, Clone)]
pub struct CmdFeedEdit {
    pub id: String,
    pub patch: FeedPatch,
}

impl CmdFeedEdit {
    pub const NAME: &str = "edit";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Change a feed's name, URL, color or sync interval")
            .arg(FeedArgs::id())
            .arg(FeedArgs::name())
            .arg(FeedArgs::url())
            .arg(FeedArgs::color())
            .arg(FeedArgs::interval())
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            id: FeedArgs::get_id(matches)?,
            patch: FeedPatch {
                name: FeedArgs::get_name(matches),
                url: FeedArgs::get_url(matches),
                color: FeedArgs::get_color(matches),
                sync_interval_minutes: FeedArgs::get_interval(matches),
            },
        })
    }

    #[tracing::instrument(skip(app))]
    pub async fn run(self, app: &mut ShiftSync) -> Result<(), Box<dyn Error>> {
        if self.patch.is_empty() {
            return Err("nothing to change, pass at least one of --name, --url, --color, --interval".into());
        }

        let feed = app.engine().update_feed(&self.id, self.patch).await?;
        println!("{} feed {} ({})", "Updated".green(), feed.name().bold(), feed.id());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdFeedRemove {
    pub id: String,
}

impl CmdFeedRemove {
    pub const NAME: &str = "remove";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("rm")
            .about("Delete a feed together with its imported shifts and sync log")
            .arg(FeedArgs::id())
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            id: FeedArgs::get_id(matches)?,
        })
    }

    #[tracing::instrument(skip(app))]
    pub async fn run(self, app: &mut ShiftSync) -> Result<(), Box<dyn Error>> {
        app.engine().delete_feed(&self.id).await?;
        println!("{} feed {}", "Removed".green(), self.id);
        Ok(())
    }
}

/// Looks up a feed, failing with [`SyncError::FeedNotFound`] when it is gone.
pub async fn require_feed(db: &LocalDb, feed_id: &str) -> Result<FeedRecord, SyncError> {
    db.feeds
        .get(feed_id)
        .await?
        .ok_or_else(|| SyncError::FeedNotFound(feed_id.to_string()))
}

struct FeedRow {
    feed: FeedRecord,
    unread_errors: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedView {
    id: String,
    calendar_id: String,
    name: String,
    url: String,
    color: String,
    sync_interval_minutes: i64,
    last_synced_at: Option<Timestamp>,
    unread_errors: i64,
}

impl From<&FeedRow> for FeedView {
    fn from(row: &FeedRow) -> Self {
        let feed = &row.feed;
        Self {
            id: feed.id().to_string(),
            calendar_id: feed.calendar_id().to_string(),
            name: feed.name().to_string(),
            url: feed.url().to_string(),
            color: feed.color().to_string(),
            sync_interval_minutes: feed.sync_interval_minutes(),
            last_synced_at: feed.last_synced_at(),
            unread_errors: row.unread_errors,
        }
    }
}

enum FeedColumn {
    Id,
    Name,
    Interval,
    LastSynced(TimeZone),
    Errors,
    Url,
}

impl Column<FeedRow> for FeedColumn {
    fn header(&self) -> &'static str {
        match self {
            FeedColumn::Id => "ID",
            FeedColumn::Name => "Name",
            FeedColumn::Interval => "Every",
            FeedColumn::LastSynced(_) => "Last synced",
            FeedColumn::Errors => "Errors",
            FeedColumn::Url => "URL",
        }
    }

    fn format(&self, data: &FeedRow) -> String {
        let feed = &data.feed;
        match self {
            FeedColumn::Id => feed.id().to_string(),
            FeedColumn::Name => feed.name().to_string(),
            FeedColumn::Interval => format!("{}m", feed.sync_interval_minutes()),
            FeedColumn::LastSynced(tz) => feed
                .last_synced_at()
                .map_or_else(|| "never".to_string(), |ts| format_timestamp(ts, tz)),
            FeedColumn::Errors => data.unread_errors.to_string(),
            FeedColumn::Url => feed.url().to_string(),
        }
    }

    fn padding_direction(&self) -> PaddingDirection {
        match self {
            FeedColumn::Interval | FeedColumn::Errors => PaddingDirection::Right,
            _ => PaddingDirection::Left,
        }
    }

    fn get_color(&self, data: &FeedRow) -> Option<Color> {
        match self {
            FeedColumn::Name => parse_hex_color(data.feed.color()),
            FeedColumn::LastSynced(_) if data.feed.last_synced_at().is_none() => {
                Some(Color::BrightBlack)
            }
            FeedColumn::Errors if data.unread_errors > 0 => Some(Color::Red),
            _ => None,
        }
    }
}
