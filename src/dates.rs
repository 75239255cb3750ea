//! Day-first date handling.
//!
//! Source sheets record dates in the day-first convention ("25/12/2024"),
//! sometimes with a time-of-day suffix. Times are discarded so that every
//! intraday observation collapses onto one calendar day.

use chrono::{Local, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d/%m/%y", "%Y-%m-%d"];

/// Parse a date cell with day-first interpretation. Unparseable input is
/// `None`, never an error.
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    None
}

/// Current wall-clock date, used when a source carries no date column at all.
pub fn run_date() -> NaiveDate {
    Local::now().date_naive()
}

/// Render a date in the day-first convention used by the source sheets.
pub fn format_day_first(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
