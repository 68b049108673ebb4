//! Time helpers in the restaurant's local calendar
//!
//! Submitted dates and times are wall-clock values in the restaurant time
//! zone. They are used as-is; no UTC conversion happens before the day type
//! is computed.

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

/// Today's date in the restaurant time zone
pub fn today_in(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Parse an `HH:MM` wall-clock time
pub fn parse_time(time: &str) -> Option<NaiveTime> {
    let time = time.trim();
    // Reject "9:30" and "09:30:00"; the form always sends zero-padded HH:MM
    if time.len() != 5 {
        return None;
    }
    NaiveTime::parse_from_str(time, "%H:%M").ok()
}

/// Canonical `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Canonical `HH:MM`
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
