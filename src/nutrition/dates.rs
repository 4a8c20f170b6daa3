//! Date helpers
//!
//! Day keys are ISO calendar dates (`YYYY-MM-DD`) in UTC.

use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's UTC calendar date
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), ISO_DATE_FORMAT)
        .map_err(|e| format!("Invalid date '{}' (expected YYYY-MM-DD): {}", s, e))
}

/// Parse an optional date, defaulting to today
pub fn parse_or_today(s: Option<&str>) -> Result<NaiveDate, String> {
    match s {
        Some(s) if !s.trim().is_empty() => parse_iso_date(s),
        _ => Ok(today_utc()),
    }
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// `date - n` days, or None before the calendar start
pub fn days_before(date: NaiveDate, n: u64) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(n))
}

/// Every date from `start` to `end` inclusive, ascending. Empty if `start > end`.
pub fn calendar_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

pub fn weekday_abbrev(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}
