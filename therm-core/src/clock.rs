//! Wall-clock time for stamping readings.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};

/// Local calendar date and time of day
pub type Timestamp = NaiveDateTime;

/// Offset east of UTC; an offset of a whole day or more falls back to UTC
pub fn utc_offset(minutes: i16) -> FixedOffset {
    FixedOffset::east_opt(i32::from(minutes) * 60).unwrap_or_else(|| Utc.fix())
}

/// Local time at `offset` for seconds since 1970-01-01T00:00:00Z.
///
/// Seconds outside chrono's range map to the epoch.
pub fn local_time(unix_secs: i64, offset: FixedOffset) -> Timestamp {
    DateTime::from_timestamp(unix_secs, 0)
        .unwrap_or_default()
        .with_timezone(&offset)
        .naive_local()
}

/// Source of the current date and time
pub trait Clock {
    fn now(&self) -> Timestamp;
}
