//! Timestamp parsing for export values.
//!
//! Everything is normalized to UTC. Values without an offset are taken as UTC,
//! never as local time, so reports do not shift with the machine they run on.
//! A value that cannot be read as a point in time is rejected rather than
//! guessed: short digit runs are not epochs and time-only values never pick
//! up today's date.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Epoch values above this are milliseconds (year 5138 in seconds).
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

/// Smallest accepted epoch, 1973-03-03. Anything shorter than nine digits is
/// a year, a compact date or a counter.
const MIN_EPOCH_SECS: f64 = 1e8;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    // ISO 8601 basic format
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M%S",
    "%Y%m%dT%H%M%SZ",
    // Teams Admin Center / Excel exports
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y%m%dT%H%M%S%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];

const TIME_OF_DAY_FORMATS: &[&str] = &[
    "%H:%M:%S%.f",
    "%H:%M:%S",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
];

/// Something that names a day: a four-digit year, a d/m pair or a month name.
static DATE_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d{4}|\d{1,2}[/.\-]\d{1,2}|\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\b")
        .unwrap()
});

/// Parse a JSON value (string or number) into a UTC timestamp.
pub fn parse_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_str(s),
        Value::Number(n) => parse_str(&n.to_string()),
        _ => None,
    }
}

/// Parse text into a UTC timestamp, trying the strict forms first.
pub fn parse_str(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // Epoch seconds or milliseconds, or a compact YYYYMMDD date
    if text.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return parse_numeric(text);
    }

    // RFC3339 / ISO 8601 with offset, the common case for JSON exports
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }

    if let Some(date) = parse_date(text) {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    // dateparser covers the long tail, but it fills a missing date with
    // today's, so only hand it values that name a day. Naive results are UTC.
    if !DATE_PART.is_match(text) {
        return None;
    }
    dateparser::parse_with_timezone(text, &Utc).ok()
}

fn parse_numeric(text: &str) -> Option<DateTime<Utc>> {
    if text.len() == 8 && !text.contains('.') {
        return parse_compact_date(text).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc());
    }
    text.parse::<f64>().ok().and_then(from_epoch)
}

fn parse_compact_date(text: &str) -> Option<NaiveDate> {
    if text.len() != 8 || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year = text[0..4].parse().ok()?;
    let month = text[4..6].parse().ok()?;
    let day = text[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a calendar date without a time of day.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| parse_compact_date(text))
}

/// Parse a time of day such as `14:32:00` or `2:32 PM`.
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let text = text.trim().trim_end_matches('Z');
    TIME_OF_DAY_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
}

/// Join separate date and time-of-day values, as found in exports with
/// `Date` and `Time` columns.
pub fn combine_date_time(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let date = parse_date(date)?;
    let time = parse_time_of_day(time)?;
    Some(date.and_time(time).and_utc())
}

/// Convert an epoch value in seconds or milliseconds.
pub fn from_epoch(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() || value < MIN_EPOCH_SECS {
        return None;
    }
    let millis = if value >= EPOCH_MILLIS_THRESHOLD {
        value
    } else {
        value * 1000.0
    };
    Utc.timestamp_millis_opt(millis.round() as i64).single()
}
