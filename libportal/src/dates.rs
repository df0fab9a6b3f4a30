//! Cinema-local (UTC+7) time helpers
//!
//! The cinemas run on Vietnam time. Timestamps sent to the backend and
//! dates shown to staff use that offset regardless of the host timezone.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

pub const VIETNAM_OFFSET: FixedOffset = match FixedOffset::east_opt(7 * 3600) {
    Some(offset) => offset,
    None => panic!("invalid UTC offset"),
};

pub fn now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&VIETNAM_OFFSET)
}

/// Current cinema-local time as ISO-8601, e.g. `2025-01-31T18:05:09.123+07:00`
pub fn current_vietnam_time() -> String {
    now().to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// `YYYY-MM-DD` of today in cinema-local time
pub fn today() -> String {
    now().date_naive().format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DD` of the first day of the current month
pub fn first_of_month() -> String {
    let today = now().date_naive();
    today
        .with_day(1)
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

/// `(month, year)` of the current month
pub fn current_month() -> (u32, i32) {
    let today = now().date_naive();
    (today.month(), today.year())
}

/// `HH:MM:SS DD/MM/YYYY` in cinema-local time
///
/// `"N/A"` for a missing value, `"Invalid Date"` for one that does not parse.
pub fn format_vietnam_time(value: Option<&str>) -> String {
    format_with(value, "%H:%M:%S %d/%m/%Y", "Invalid Date")
}

/// `DD/MM/YYYY` in cinema-local time
pub fn format_vietnam_date(value: Option<&str>) -> String {
    format_with(value, "%d/%m/%Y", "Invalid Date")
}

/// `HH:MM:SS` in cinema-local time
pub fn format_vietnam_time_only(value: Option<&str>) -> String {
    format_with(value, "%H:%M:%S", "Invalid Time")
}

fn format_with(value: Option<&str>, pattern: &str, invalid: &str) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => "N/A".to_string(),
        Some(value) => match parse(value) {
            Some(instant) => instant.with_timezone(&VIETNAM_OFFSET).format(pattern).to_string(),
            None => invalid.to_string(),
        },
    }
}

/// Accepts RFC 3339, offset-less date-times (taken as UTC) and bare dates
fn parse(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, pattern) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
