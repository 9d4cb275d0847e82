//! Shared utilities for CLI commands.

use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveDateTime};

use ttr_db::Database;
use ttr_core::Task;

/// Timestamp input formats accepted on the command line, tried in order.
const INPUT_TS_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a user-supplied timestamp.
///
/// Accepts ISO 8601 with or without seconds, with `T` or a space between
/// date and time (e.g. `2024-01-15T09:00:00`, `2024-01-15 09:00`).
pub fn parse_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
    let s = s.trim();
    for format in INPUT_TS_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(ts);
        }
    }
    anyhow::bail!("invalid timestamp: {s}. Use e.g. 2024-01-15T09:00:00 or '2024-01-15 09:00'")
}

/// The current local wall-clock time, truncated to second precision so it
/// round-trips through the storage format exactly.
pub fn now() -> NaiveDateTime {
    use chrono::Timelike;
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// The current local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolves a date argument, defaulting to today.
pub fn date_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(today)
}

/// Looks up a task by name, failing with a friendly message.
pub fn resolve_task(db: &Database, name: &str) -> anyhow::Result<Task> {
    db.find_task_by_name(name)
        .with_context(|| format!("failed to look up task '{name}'"))?
        .ok_or_else(|| anyhow::anyhow!("no task named '{name}'"))
}
