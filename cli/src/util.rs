// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::io;

use clap::ValueEnum;
use colored::Color;
use jiff::{Timestamp, tz::TimeZone};
use serde::Serialize;

use crate::table::{Column, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

impl OutputFormat {
    /// Prints `rows` as pretty JSON or as a table with the given columns.
    pub fn print<T, C, V>(
        self,
        columns: &[C],
        rows: &[T],
        view: impl Fn(&T) -> V,
    ) -> Result<(), Box<dyn Error>>
    where
        C: Column<T>,
        V: Serialize,
    {
        match self {
            OutputFormat::Json => {
                let views: Vec<V> = rows.iter().map(view).collect();
                println!("{}", serde_json::to_string_pretty(&views)?);
            }
            OutputFormat::Table => {
                Table::new(columns, rows).write_to(&mut io::stdout().lock())?;
            }
        }
        Ok(())
    }
}

/// Formats a timestamp in the given zone, minute precision.
pub fn format_timestamp(ts: Timestamp, tz: &TimeZone) -> String {
    ts.to_zoned(tz.clone()).strftime("%Y-%m-%d %H:%M").to_string()
}

/// Parses a `#rrggbb` string into a terminal color.
pub fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::TrueColor {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}
