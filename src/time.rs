//! Timestamp utilities
//!
//! Store timestamps use a fixed `%Y-%m-%d-%H:%M:%S` format whose
//! lexicographic order matches chronological order, so the scheduler can
//! sort records as plain strings.

use chrono::{Duration, Local, NaiveDateTime};

/// Timestamp format used in the persisted store
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";

/// Sentinel for records that have never been updated; sorts before every
/// real timestamp
pub const EPOCH_SENTINEL: &str = "1970-01-01-00:00:00";

/// Current local time in store format
pub fn now_stamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a store timestamp; `None` for malformed values
pub fn parse_stamp(stamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

/// Whether `stamp` falls within the last `window_hours` hours.
///
/// Malformed timestamps count as outside the window (never updated).
/// Future-dated timestamps count as inside it.
pub fn within_window(stamp: &str, window_hours: u64) -> bool {
    match parse_stamp(stamp) {
        Some(updated) => {
            Local::now().naive_local() - updated < Duration::hours(window_hours as i64)
        }
        None => false,
    }
}
