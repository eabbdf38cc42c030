//! Local wall-clock parsing helpers.
//!
//! All planner instants are naive local times; offsets present in input are
//! dropped after reading the wall-clock part.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses an ISO-8601 date or date-time into a local wall-clock instant.
///
/// Date-only input resolves to midnight.
pub fn parse_local_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(value) = parse_with_time(trimmed) {
        return Some(value);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Parses an inclusive end bound.
///
/// Date-only input covers the whole day, up to the last millisecond.
pub fn parse_end_bound(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(value) = parse_with_time(trimmed) {
        return Some(value);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_milli_opt(23, 59, 59, 999))
}

fn parse_with_time(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|with_offset| with_offset.naive_local())
        })
}
