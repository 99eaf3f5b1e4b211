use chrono::{DateTime, TimeZone, Utc};

/// Converts platform epoch seconds into a UTC timestamp.
///
/// Out of range values collapse to the Unix epoch.
pub fn unix_to_datetime(timestamp: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(timestamp, 0).single().unwrap_or_default()
}

pub fn datetime_to_unix(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp()
}
