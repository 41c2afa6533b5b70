use chrono::{DateTime, Utc};

/// Convert a UTC timestamp to epoch milliseconds, the storage format of every
/// time column in the ledger.
pub fn to_epoch_millis(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Convert epoch milliseconds back to a UTC timestamp.
/// Out-of-range values fall back to 1970-01-01.
pub fn from_epoch_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
