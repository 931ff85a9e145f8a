// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Normalization of iCalendar documents into flat external events.
//!
//! Only the literal `DTSTART`/`DTEND` of each `VEVENT` is imported; recurrence
//! rules are not expanded. Individual events that cannot be tracked are
//! skipped instead of failing the whole document.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use icalendar::parser::{Component, Property, read_calendar, unfold};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::{Timestamp, Zoned};

use crate::error::ParseError;

const UNTITLED: &str = "Untitled";
const ALL_DAY_START: &str = "00:00";
const ALL_DAY_END: &str = "23:59";

/// One event of a remote feed, normalized to local wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEvent {
    /// The `UID` assigned by the remote source.
    pub uid: String,

    /// Summary, `Untitled` when absent.
    pub title: String,

    /// Description, if any.
    pub description: Option<String>,

    /// `COLOR` property (RFC 7986), if any.
    pub color: Option<String>,

    /// Local calendar date of the start instant.
    pub date: Date,

    /// Whether the event spans the whole day.
    pub all_day: bool,

    /// Local start time as `HH:MM`.
    pub start_time: String,

    /// Local end time as `HH:MM`.
    pub end_time: String,
}

/// Parses a calendar document into events, in document order.
///
/// `tz` is the local zone used for dates and wall-clock times.
///
/// # Errors
///
/// Returns [`ParseError`] when the document as a whole is not readable.
pub fn parse_feed(text: &str, tz: &TimeZone) -> Result<Vec<ExternalEvent>, ParseError> {
    let text = text.trim_start_matches('\u{feff}');
    if !text
        .lines()
        .any(|line| line.trim().eq_ignore_ascii_case("BEGIN:VCALENDAR"))
    {
        return Err(ParseError::MissingCalendar);
    }

    let unfolded = unfold(text);
    let calendar = read_calendar(&unfolded).map_err(|e| ParseError::Syntax(e.to_string()))?;

    let mut vevents = Vec::new();
    collect_vevents(&calendar.components, &mut vevents);

    let mut events = Vec::with_capacity(vevents.len());
    let mut skipped = 0_usize;
    for vevent in vevents {
        match normalize_event(vevent, tz) {
            Some(event) => events.push(event),
            None => skipped += 1,
        }
    }

    tracing::debug!(events = events.len(), skipped, "feed parsed");
    Ok(events)
}

fn collect_vevents<'a, 'b>(components: &'b [Component<'a>], out: &mut Vec<&'b Component<'a>>) {
    for component in components {
        if component.name.as_ref().eq_ignore_ascii_case("VEVENT") {
            out.push(component);
        } else if component.name.as_ref().eq_ignore_ascii_case("VCALENDAR") {
            collect_vevents(&component.components, out);
        }
    }
}

fn normalize_event(vevent: &Component<'_>, tz: &TimeZone) -> Option<ExternalEvent> {
    let Some(uid) = text_prop(vevent, "UID") else {
        tracing::debug!("skipping event without UID");
        return None;
    };

    let start = vevent.find_prop("DTSTART").and_then(|p| to_instant(p, tz));
    let end = vevent.find_prop("DTEND").and_then(|p| to_instant(p, tz));

    let (date, all_day, start_time, end_time) = match (start, end) {
        (Some(Instant::At(start)), Some(Instant::At(end))) => {
            (start.date(), false, clock(&start), clock(&end))
        }
        (Some(anchor), _) | (None, Some(anchor)) => (
            anchor.date(),
            true,
            ALL_DAY_START.to_string(),
            ALL_DAY_END.to_string(),
        ),
        (None, None) => {
            tracing::debug!(uid = %uid, "skipping event without start and end");
            return None;
        }
    };

    let title = text_prop(vevent, "SUMMARY").unwrap_or_else(|| UNTITLED.to_string());
    Some(ExternalEvent {
        uid,
        title,
        description: text_prop(vevent, "DESCRIPTION"),
        color: text_prop(vevent, "COLOR"),
        date,
        all_day,
        start_time,
        end_time,
    })
}

enum Instant {
    Day(Date),
    At(Zoned),
}

impl Instant {
    fn date(&self) -> Date {
        match self {
            Self::Day(date) => *date,
            Self::At(zoned) => zoned.date(),
        }
    }
}

fn to_instant(prop: &Property<'_>, tz: &TimeZone) -> Option<Instant> {
    let value = match DatePerhapsTime::try_from(prop) {
        Ok(value) => value,
        Err(_) => {
            tracing::debug!(name = %prop.name.as_ref(), value = %prop.val.as_ref(), "unreadable date property");
            return None;
        }
    };

    match value {
        DatePerhapsTime::Date(date) => civil_date(date).map(Instant::Day),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Timestamp::from_second(dt.timestamp())
            .ok()
            .map(|ts| Instant::At(ts.to_zoned(tz.clone()))),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => civil_datetime(naive)
            .and_then(|dt| dt.to_zoned(tz.clone()).ok())
            .map(Instant::At),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let source_tz = resolve_tzid(&tzid).unwrap_or_else(|| tz.clone());
            civil_datetime(date_time)
                .and_then(|dt| dt.to_zoned(source_tz).ok())
                .map(|zoned| Instant::At(zoned.with_time_zone(tz.clone())))
        }
    }
}

fn resolve_tzid(tzid: &str) -> Option<TimeZone> {
    let name = tzid.trim().trim_matches('"');
    match TimeZone::get(name) {
        Ok(tz) => Some(tz),
        Err(e) => {
            tracing::warn!(tzid = name, err = %e, "unknown TZID, using local time zone");
            None
        }
    }
}

fn civil_date(date: NaiveDate) -> Option<Date> {
    Date::new(
        i16::try_from(date.year()).ok()?,
        i8::try_from(date.month()).ok()?,
        i8::try_from(date.day()).ok()?,
    )
    .ok()
}

fn civil_datetime(dt: NaiveDateTime) -> Option<DateTime> {
    DateTime::new(
        i16::try_from(dt.year()).ok()?,
        i8::try_from(dt.month()).ok()?,
        i8::try_from(dt.day()).ok()?,
        i8::try_from(dt.hour()).ok()?,
        i8::try_from(dt.minute()).ok()?,
        i8::try_from(dt.second()).ok()?,
        0,
    )
    .ok()
}

fn clock(zoned: &Zoned) -> String {
    format!("{:02}:{:02}", zoned.hour(), zoned.minute())
}

fn text_prop(component: &Component<'_>, name: &str) -> Option<String> {
    component
        .find_prop(name)
        .map(|p| unescape_text(p.val.as_ref()).trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Reverses RFC 5545 TEXT escaping.
fn unescape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
