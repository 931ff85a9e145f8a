// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{Arg, ArgMatches, arg, value_parser};

use crate::util::OutputFormat;

#[derive(Debug, Clone, Copy)]
pub struct CommonArgs;

impl CommonArgs {
    pub fn output_format() -> Arg {
        arg!(--"output-format" <FORMAT> "Output format")
            .value_parser(value_parser!(OutputFormat))
            .default_value("table")
    }

    pub fn get_output_format(matches: &ArgMatches) -> OutputFormat {
        matches
            .get_one("output-format")
            .copied()
            .unwrap_or(OutputFormat::Table)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FeedArgs;

impl FeedArgs {
    pub fn id() -> Arg {
        arg!(id: <FEED_ID> "The id of the feed")
    }

    pub fn get_id(matches: &ArgMatches) -> Result<String, Box<dyn Error>> {
        required(matches, "id")
    }

    pub fn calendar() -> Arg {
        arg!(--calendar <CALENDAR_ID> "The calendar the feed imports into")
            .required(false)
    }

    pub fn get_calendar(matches: &ArgMatches) -> Option<String> {
        matches.get_one("calendar").cloned()
    }

    pub fn name() -> Arg {
        arg!(--name <NAME> "Display name of the feed")
            .required(false)
    }

    pub fn get_name(matches: &ArgMatches) -> Option<String> {
        matches.get_one("name").cloned()
    }

    pub fn url() -> Arg {
        arg!(--url <URL> "Published calendar URL (https or webcal)")
            .required(false)
    }

    pub fn get_url(matches: &ArgMatches) -> Option<String> {
        matches.get_one("url").cloned()
    }

    pub fn color() -> Arg {
        arg!(--color <COLOR> "Color given to imported shifts, e.g. #10b981")
            .required(false)
    }

    pub fn get_color(matches: &ArgMatches) -> Option<String> {
        matches.get_one("color").cloned()
    }

    pub fn interval() -> Arg {
        arg!(--interval <MINUTES> "Minutes between automatic syncs")
            .required(false)
            .value_parser(value_parser!(u32))
    }

    pub fn get_interval(matches: &ArgMatches) -> Option<u32> {
        matches.get_one("interval").copied()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CalendarArgs;

impl CalendarArgs {
    pub fn id() -> Arg {
        arg!(calendar: <CALENDAR_ID> "The id of the calendar")
    }

    pub fn get_id(matches: &ArgMatches) -> Result<String, Box<dyn Error>> {
        required(matches, "calendar")
    }
}

fn required(matches: &ArgMatches, id: &str) -> Result<String, Box<dyn Error>> {
    matches
        .get_one::<String>(id)
        .cloned()
        .ok_or_else(|| format!("missing required argument `{id}`").into())
}
