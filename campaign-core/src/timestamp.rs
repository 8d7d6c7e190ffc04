//! ISO-8601 timestamps for `createdAt` / `updatedAt`.
//!
//! Timestamps are UTC with millisecond precision and a `Z` suffix, so values
//! produced here also sort correctly as plain strings.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time as an ISO-8601 string.
pub fn now() -> String {
    format(Utc::now())
}

/// Format a UTC time the way the store persists it.
pub fn format(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 / RFC 3339 timestamp.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

/// The next `updatedAt` for an entity whose last stamp was `previous`.
///
/// Never earlier than `previous`, even if the wall clock stepped backwards.
pub fn advance(previous: Option<&str>) -> String {
    let now = Utc::now();
    match previous.and_then(parse) {
        Some(previous) if previous > now => format(previous),
        _ => format(now),
    }
}
