//! Pre-pivot year exclusion.

use std::borrow::Cow;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::domain::entities::columns::{resolve_column, DATE_CANDIDATES, YEAR_CANDIDATES};
use crate::domain::entities::table::{CellValue, Table};

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YearSource {
    Year(usize),
    Date(usize),
}

/// Drops every row whose year equals `year`. Rows with no readable year stay.
/// Without any year or date column the table is returned untouched.
pub fn exclude_year(table: Cow<'_, Table>, year: i32) -> Cow<'_, Table> {
    let Some(source) = find_year_source(&table) else {
        warn!(year, "no year or date column found, year exclusion skipped");
        return table;
    };
    debug!(year, ?source, "excluding year");
    let filtered = table.filter_rows(|row| row_year(row, source) != Some(year));
    Cow::Owned(filtered)
}

fn find_year_source(table: &Table) -> Option<YearSource> {
    if let Some(idx) = resolve_column(table, &YEAR_CANDIDATES) {
        return Some(YearSource::Year(idx));
    }

    let mut ordered: Vec<usize> = DATE_CANDIDATES
        .iter()
        .filter_map(|candidate| resolve_column(table, &[*candidate]))
        .collect();
    let remaining: Vec<usize> = (0..table.columns().len())
        .filter(|idx| !ordered.contains(idx))
        .collect();
    ordered.extend(remaining);

    ordered
        .into_iter()
        .find(|idx| mostly_dates(table, *idx))
        .map(YearSource::Date)
}

/// At least half of the column's non-null values parse as dates.
fn mostly_dates(table: &Table, idx: usize) -> bool {
    let mut present = 0_usize;
    let mut parsed = 0_usize;
    for row in table.rows() {
        let cell = &row[idx];
        if is_blank(cell) {
            continue;
        }
        present += 1;
        if date_of(cell).is_some() {
            parsed += 1;
        }
    }
    present > 0 && parsed * 2 >= present
}

fn is_blank(cell: &CellValue) -> bool {
    match cell {
        CellValue::Null => true,
        CellValue::Text(value) => value.trim().is_empty(),
        _ => false,
    }
}

fn row_year(row: &[CellValue], source: YearSource) -> Option<i32> {
    match source {
        YearSource::Year(idx) => year_of(&row[idx]),
        YearSource::Date(idx) => date_of(&row[idx]).map(|date| date.year()),
    }
}

fn year_of(cell: &CellValue) -> Option<i32> {
    match cell {
        CellValue::Int(value) => i32::try_from(*value).ok(),
        CellValue::Float(value) if value.fract() == 0.0 => Some(*value as i32),
        CellValue::Text(value) => value.trim().parse::<i32>().ok(),
        _ => None,
    }
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|datetime| datetime.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        })
}

fn date_of(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Text(value) => parse_date(value),
        _ => None,
    }
}
