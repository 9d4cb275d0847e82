//! Daily report aggregation.
//!
//! Turns a day's entry rows into per-task totals and a grand total.
//! Report groups are ordered by importance then total time, which is
//! deliberately different from the day listing order (importance then
//! task name then start time): a report ranks tasks by where the time
//! went.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entry::{EntryRow, round_hours};

/// Aggregated totals for one task on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_name: String,
    pub important: bool,
    /// Sum of persisted entry durations, rounded to 2 decimals.
    pub total_hours: f64,
    pub entry_count: usize,
    /// Entries still open when the report was built. Their persisted
    /// duration is 0, so they are counted but never inflate the total.
    pub open_count: usize,
}

/// Per-task totals and the grand total for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub tasks: Vec<TaskSummary>,
    pub total_hours: f64,
    pub task_count: usize,
}

/// One row of the tabular export handed to the spreadsheet sink.
///
/// `important` is `None` on the trailing total row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub task: String,
    pub important: Option<bool>,
    pub hours: f64,
}

/// Groups a day's entries by task, summing durations.
///
/// Groups are ordered important-first, then by total hours descending,
/// then by name for determinism. Open entries are included with their
/// persisted zero duration and surfaced through `open_count`.
pub fn daily_report(date: NaiveDate, rows: &[EntryRow]) -> DailyReport {
    struct Acc {
        important: bool,
        total_hours: f64,
        entry_count: usize,
        open_count: usize,
    }

    let mut groups: HashMap<&str, Acc> = HashMap::new();
    for row in rows {
        let acc = groups.entry(row.task_name.as_str()).or_insert(Acc {
            important: row.important,
            total_hours: 0.0,
            entry_count: 0,
            open_count: 0,
        });
        acc.total_hours += row.entry.duration_h;
        acc.entry_count += 1;
        if row.entry.is_open() {
            acc.open_count += 1;
        }
    }

    let mut tasks: Vec<TaskSummary> = groups
        .into_iter()
        .map(|(name, acc)| TaskSummary {
            task_name: name.to_string(),
            important: acc.important,
            total_hours: round_hours(acc.total_hours),
            entry_count: acc.entry_count,
            open_count: acc.open_count,
        })
        .collect();
    tasks.sort_by(|a, b| {
        b.important
            .cmp(&a.important)
            .then(b.total_hours.total_cmp(&a.total_hours))
            .then(a.task_name.cmp(&b.task_name))
    });

    let total_hours = round_hours(tasks.iter().map(|t| t.total_hours).sum());
    let task_count = tasks.len();
    DailyReport {
        date,
        tasks,
        total_hours,
        task_count,
    }
}

/// Builds export rows from a report: one per task plus a trailing total.
///
/// With `only_important` set, unimportant tasks are dropped and the total
/// covers only what remains.
pub fn summary_rows(report: &DailyReport, only_important: bool) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = report
        .tasks
        .iter()
        .filter(|t| !only_important || t.important)
        .map(|t| SummaryRow {
            task: t.task_name.clone(),
            important: Some(t.important),
            hours: t.total_hours,
        })
        .collect();
    let total = round_hours(rows.iter().map(|r| r.hours).sum());
    rows.push(SummaryRow {
        task: "Total".to_string(),
        important: None,
        hours: total,
    });
    rows
}
