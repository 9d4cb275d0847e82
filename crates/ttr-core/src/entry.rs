//! Entry records and duration arithmetic.
//!
//! # Timestamp format
//!
//! Timestamps are local wall-clock values persisted as ISO 8601 text with
//! second precision (e.g., `2024-01-15T10:30:00`). Day bucketing is a
//! local-calendar concept, so no timezone is stored; lexicographic
//! ordering of the stored text matches chronological ordering.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Storage format for entry timestamps.
pub const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Storage format for date keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Formats a timestamp for storage.
pub fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// Parses a stored timestamp.
pub fn parse_ts(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT)
}

/// Rounds hours to the fixed 2-decimal precision used everywhere.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Elapsed hours between two timestamps, rounded.
#[allow(clippy::cast_precision_loss)]
pub fn duration_hours(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let seconds = (end - start).num_seconds();
    round_hours(seconds as f64 / 3600.0)
}

/// The calendar day an entry starting at `ts` is filed under.
pub fn date_key_for(ts: NaiveDateTime) -> NaiveDate {
    ts.date()
}

/// One timed interval of work against a task.
///
/// An entry with no `end_ts` is open (in progress); `active` mirrors that
/// and the storage layer keeps the two consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub task_id: i64,
    pub start_ts: NaiveDateTime,
    pub end_ts: Option<NaiveDateTime>,
    /// Hours between start and end, rounded to 2 decimals; 0 while open.
    pub duration_h: f64,
    pub date_key: NaiveDate,
    pub active: bool,
}

impl Entry {
    /// Whether the entry is still in progress.
    pub const fn is_open(&self) -> bool {
        self.end_ts.is_none()
    }

    /// Hours to display for this entry: the persisted duration when
    /// closed, a live value computed against `now` when open.
    ///
    /// The live value is never persisted.
    pub fn display_hours(&self, now: NaiveDateTime) -> f64 {
        if self.is_open() {
            duration_hours(self.start_ts, now).max(0.0)
        } else {
            self.duration_h
        }
    }
}

/// An entry joined with the columns of its owning task.
///
/// This is the shape day listings and reports consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRow {
    #[serde(flatten)]
    pub entry: Entry,
    pub task_name: String,
    pub category: String,
    pub important: bool,
}
