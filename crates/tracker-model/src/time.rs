//! Timestamp parsing and formatting.
//!
//! The addon recorded start times either as epoch seconds (newer
//! versions, from `time()`) or as preformatted `date("%Y-%m-%d %H:%M:%S")`
//! strings. Storage always uses the string form.

use chrono::{DateTime, NaiveDateTime};

/// Timestamp format used in the runs table and in the export.
pub const STORAGE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn timestamp_from_str(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), STORAGE_TIME_FORMAT).ok()
}

pub fn timestamp_from_epoch(secs: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(STORAGE_TIME_FORMAT).to_string()
}
