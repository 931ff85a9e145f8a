// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command, arg};
use colored::Colorize;
use jiff::{Timestamp, tz::TimeZone};
use serde::Serialize;
use shiftsync_core::{ShiftSync, localdb::CalendarRecord};

use crate::arg::CommonArgs;
use crate::table::Column;
use crate::util::{OutputFormat, format_timestamp};

#[derive(Debug, Clone)]
pub struct CmdCalendarAdd {
    pub name: String,
}

impl CmdCalendarAdd {
    pub const NAME: &str = "add";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Create a calendar to import feeds into")
            .arg(arg!(name: <NAME> "Name of the calendar"))
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let name = matches
            .get_one::<String>("name")
            .cloned()
            .ok_or("calendar name is required")?;
        Ok(Self { name })
    }

    #[tracing::instrument(skip(app))]
    pub async fn run(self, app: &mut ShiftSync) -> Result<(), Box<dyn Error>> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("calendar name must not be empty".into());
        }

        let calendar = app.db().calendars.insert(name).await?;
        println!(
            "{} calendar {} ({})",
            "Created".green(),
            calendar.name().bold(),
            calendar.id()
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CmdCalendarList {
    pub output_format: OutputFormat,
}

impl CmdCalendarList {
    pub const NAME: &str = "list";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("List calendars")
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    #[tracing::instrument(skip(app))]
    pub async fn run(self, app: &mut ShiftSync) -> Result<(), Box<dyn Error>> {
        let calendars = app.db().calendars.list().await?;
        let tz = app.engine().options().timezone.clone();
        let columns = [
            CalendarColumn::Id,
            CalendarColumn::Name,
            CalendarColumn::Created(tz),
        ];
        self.output_format
            .print(&columns, &calendars, |c| CalendarView::from(c))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CalendarView {
    id: String,
    name: String,
    created_at: Option<Timestamp>,
}

impl From<&CalendarRecord> for CalendarView {
    fn from(calendar: &CalendarRecord) -> Self {
        Self {
            id: calendar.id().to_string(),
            name: calendar.name().to_string(),
            created_at: calendar.created_at(),
        }
    }
}

enum CalendarColumn {
    Id,
    Name,
    Created(TimeZone),
}

impl Column<CalendarRecord> for CalendarColumn {
    fn header(&self) -> &'static str {
        match self {
            CalendarColumn::Id => "ID",
            CalendarColumn::Name => "Name",
            CalendarColumn::Created(_) => "Created",
        }
    }

    fn format(&self, data: &CalendarRecord) -> String {
        match self {
            CalendarColumn::Id => data.id().to_string(),
            CalendarColumn::Name => data.name().to_string(),
            CalendarColumn::Created(tz) => data
                .created_at()
                .map(|ts| format_timestamp(ts, tz))
                .unwrap_or_default(),
        }
    }
}
