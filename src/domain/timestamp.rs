//! Timestamp normalization
//!
//! Fragment and time-travel arguments accept either UNIX seconds or an
//! ISO 8601 date/date-time. Naive date-times are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TimestampError {
    #[error("Invalid timestamp '{0}': expected UNIX seconds or an ISO 8601 date")]
    Invalid(String),
}

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Converts UNIX seconds or an ISO 8601 string to UNIX seconds
pub fn to_unix_time(datestr: &str) -> Result<i64, TimestampError> {
    let s = datestr.trim();
    let invalid = || TimestampError::Invalid(datestr.to_string());

    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i64>().map_err(|_| invalid());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }

    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.timestamp());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.and_utc().timestamp());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso8601_utc() {
        assert_eq!(to_unix_time("1970-01-01T00:00:01Z"), Ok(1));
        assert_eq!(to_unix_time("1970-01-01T00:00:02Z"), Ok(2));
        assert_eq!(to_unix_time("1970-01-01T00:00:03Z"), Ok(3));
    }

    #[test]
    fn unix_seconds() {
        assert_eq!(to_unix_time("2"), Ok(2));
        assert_eq!(to_unix_time("1700000000"), Ok(1_700_000_000));
    }

    #[test]
    fn offsets_are_applied() {
        assert_eq!(to_unix_time("1970-01-01T01:00:00+01:00"), Ok(0));
        assert_eq!(to_unix_time("1970-01-01T01:00:00+0100"), Ok(0));
    }

    #[test]
    fn naive_values_are_utc() {
        assert_eq!(to_unix_time("1970-01-01T00:01:00"), Ok(60));
        assert_eq!(to_unix_time("1970-01-01 00:00:05"), Ok(5));
        assert_eq!(to_unix_time("1970-01-02"), Ok(86_400));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(
            to_unix_time("yesterday"),
            Err(TimestampError::Invalid("yesterday".to_string()))
        );
        assert!(to_unix_time("").is_err());
        assert!(to_unix_time("-5").is_err());
    }
}
