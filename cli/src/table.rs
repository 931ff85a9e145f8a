// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{io, marker::PhantomData};

use colored::{Color, Colorize};
use unicode_width::UnicodeWidthStr;

pub struct Table<'a, T, C: Column<T>> {
    pub columns: &'a [C],
    pub separator: &'a str,
    pub padding: bool,
    pub header: bool,
    pub data: &'a [T],
}

impl<'a, T, C: Column<T>> Table<'a, T, C> {
    pub fn new(columns: &'a [C], data: &'a [T]) -> Self {
        Self {
            columns,
            separator: "  ",
            padding: true,
            header: true,
            data,
        }
    }

    pub fn write_to(&self, w: &mut impl io::Write) -> io::Result<()> {
        let table: Vec<Vec<String>> = self
            .data
            .iter()
            .map(|row| self.columns.iter().map(|col| col.format(row)).collect())
            .collect();

        let headers: Vec<String> = self.columns.iter().map(|c| c.header().to_string()).collect();
        let columns = self.compute_columns(&headers, &table);

        if self.header {
            let cells = columns
                .iter()
                .zip(headers)
                .map(|(col, cell)| col.pad(cell).bold().to_string());
            self.write_row(w, cells)?;
        }

        for (cells, row) in table.into_iter().zip(self.data) {
            let cells = columns
                .iter()
                .zip(cells)
                .map(|(col, cell)| col.stylize_cell(row, cell));
            self.write_row(w, cells)?;
        }

        Ok(())
    }

    fn write_row(
        &self,
        w: &mut impl io::Write,
        cells: impl Iterator<Item = String>,
    ) -> io::Result<()> {
        let line = cells.collect::<Vec<_>>().join(self.separator);
        writeln!(w, "{}", line.trim_end())
    }

    fn compute_columns(
        &self,
        headers: &[String],
        table: &[Vec<String>],
    ) -> Vec<ColumnStylizer<'_, T, C>> {
        let max_widths = self.padding.then(|| {
            let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
            for row in table {
                for (i, cell) in row.iter().enumerate() {
                    widths[i] = widths[i].max(cell.width());
                }
            }
            widths
        });

        let last = self.columns.len().saturating_sub(1);
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let direction = col.padding_direction();
                // a left-aligned last column needs no trailing spaces
                let padding = match &max_widths {
                    Some(_) if i == last && direction == PaddingDirection::Left => None,
                    Some(widths) => Some((widths[i], direction)),
                    None => None,
                };
                ColumnStylizer {
                    config: col,
                    padding,
                    _marker: PhantomData,
                }
            })
            .collect()
    }
}

pub trait Column<T> {
    fn header(&self) -> &'static str;
    fn format(&self, data: &T) -> String;
    fn padding_direction(&self) -> PaddingDirection {
        PaddingDirection::Left
    }
    fn get_color(&self, _data: &T) -> Option<Color> {
        None
    }
}

struct ColumnStylizer<'a, T, C: Column<T>> {
    config: &'a C,
    /// padding width and direction
    padding: Option<(usize, PaddingDirection)>,
    _marker: PhantomData<T>,
}

impl<T, C: Column<T>> ColumnStylizer<'_, T, C> {
    fn stylize_cell(&self, data: &T, cell: String) -> String {
        let cell = self.pad(cell);
        match self.config.get_color(data) {
            Some(color) => cell.color(color).to_string(),
            None => cell,
        }
    }

    // width-aware, since `format!` padding counts chars rather than columns
    fn pad(&self, cell: String) -> String {
        match self.padding {
            Some((width, direction)) => {
                let fill = " ".repeat(width.saturating_sub(cell.width()));
                match direction {
                    PaddingDirection::Left => cell + &fill,
                    PaddingDirection::Right => fill + &cell,
                }
            }
            None => cell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingDirection {
    Left,
    Right,
}
