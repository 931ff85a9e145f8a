// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use colored::Color;
use jiff::civil::Date;
use serde::Serialize;
use shiftsync_core::{ShiftSync, SyncError};
use shiftsync_core::localdb::ShiftRecord;

use crate::arg::{CalendarArgs, CommonArgs};
use crate::table::Column;
use crate::util::{OutputFormat, parse_hex_color};

#[derive(Debug, Clone)]
pub struct CmdShiftList {
    pub calendar_id: String,
    pub output_format: OutputFormat,
}

impl CmdShiftList {
    pub const NAME: &str = "list";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("List the shifts of a calendar in date order")
            .arg(CalendarArgs::id())
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            calendar_id: CalendarArgs::get_id(matches)?,
            output_format: CommonArgs::get_output_format(matches),
        })
    }

    #[tracing::instrument(skip(app))]
    pub async fn run(self, app: &mut ShiftSync) -> Result<(), Box<dyn Error>> {
        let db = app.db();
        if db.calendars.get(&self.calendar_id).await?.is_none() {
            return Err(SyncError::CalendarNotFound(self.calendar_id).into());
        }

        let shifts = db.shifts.list_by_calendar(&self.calendar_id).await?;
        let columns = [
            ShiftColumn::Date,
            ShiftColumn::Time,
            ShiftColumn::Title,
            ShiftColumn::Source,
        ];
        self.output_format
            .print(&columns, &shifts, |shift| ShiftView::from(shift))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShiftView {
    id: String,
    date: Option<Date>,
    start_time: String,
    end_time: String,
    all_day: bool,
    title: String,
    description: Option<String>,
    color: Option<String>,
    feed_id: Option<String>,
    external_id: Option<String>,
}

impl From<&ShiftRecord> for ShiftView {
    fn from(shift: &ShiftRecord) -> Self {
        Self {
            id: shift.id().to_string(),
            date: shift.date(),
            start_time: shift.start_time().to_string(),
            end_time: shift.end_time().to_string(),
            all_day: shift.all_day(),
            title: shift.title().to_string(),
            description: shift.description().map(str::to_string),
            color: shift.color().map(str::to_string),
            feed_id: shift.feed_id().map(str::to_string),
            external_id: shift.external_id().map(str::to_string),
        }
    }
}

enum ShiftColumn {
    Date,
    Time,
    Title,
    Source,
}

impl Column<ShiftRecord> for ShiftColumn {
    fn header(&self) -> &'static str {
        match self {
            ShiftColumn::Date => "Date",
            ShiftColumn::Time => "Time",
            ShiftColumn::Title => "Title",
            ShiftColumn::Source => "Source",
        }
    }

    fn format(&self, data: &ShiftRecord) -> String {
        match self {
            ShiftColumn::Date => data.date().map(|d| d.to_string()).unwrap_or_default(),
            ShiftColumn::Time if data.all_day() => "all day".to_string(),
            ShiftColumn::Time => format!("{}-{}", data.start_time(), data.end_time()),
            ShiftColumn::Title => data.title().to_string(),
            ShiftColumn::Source => match data.feed_id() {
                Some(_) => "feed".to_string(),
                None => "manual".to_string(),
            },
        }
    }

    fn get_color(&self, data: &ShiftRecord) -> Option<Color> {
        match self {
            ShiftColumn::Title => data.color().and_then(parse_hex_color),
            ShiftColumn::Source if data.synced() => Some(Color::BrightBlack),
            _ => None,
        }
    }
}
