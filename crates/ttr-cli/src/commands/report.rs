//! Report command: per-task totals for one day.
//!
//! Report groups are ranked by importance then total time, which is
//! deliberately not the day-listing order - a report answers "where did
//! the time go", not "what happened when".

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;

use ttr_core::{DailyReport, daily_report};
use ttr_db::Database;

/// Builds the report for a day from the store.
pub fn generate(db: &Database, date: NaiveDate) -> Result<DailyReport> {
    let rows = db.list_entries_for_date(date)?;
    Ok(daily_report(date, &rows))
}

/// Formats the human-readable report output.
pub fn format_report(report: &DailyReport) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    writeln!(output, "DAILY REPORT: {}", report.date).unwrap();

    if report.tasks.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No entries recorded on {}.", report.date).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Run 'ttr start <task>' to begin tracking.").unwrap();
        return output;
    }

    writeln!(output).unwrap();
    writeln!(
        output,
        "{:<22}  {:<2}  {:>7}  {:>7}",
        "Task", "W", "Hours", "Entries"
    )
    .unwrap();
    for task in &report.tasks {
        let flag = if task.important { "*" } else { "" };
        let open_note = if task.open_count > 0 {
            format!("  ({} open)", task.open_count)
        } else {
            String::new()
        };
        writeln!(
            output,
            "{:<22}  {:<2}  {:>7.2}  {:>7}{open_note}",
            task.task_name, flag, task.total_hours, task.entry_count
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(
        output,
        "Total: {:.2}h across {} task(s)",
        report.total_hours, report.task_count
    )
    .unwrap();
    output
}

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, db: &Database, date: NaiveDate, json: bool) -> Result<()> {
    let report = generate(db, date)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_report(&report))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn ts(h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        let x = db.add_task("TaskX", None, false).unwrap();
        let y = db.add_task("TaskY", None, false).unwrap();
        for (task, start, end) in [
            (x, ts(9, 0), ts(10, 0)),
            (x, ts(11, 0), ts(12, 30)),
            (y, ts(14, 0), ts(14, 30)),
        ] {
            let id = db.start_entry(task, start).unwrap();
            db.stop_entry(id, end).unwrap();
        }
        db
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "rounded values are exact")]
    fn aggregates_the_day() {
        let db = seeded_db();
        let report = generate(&db, day()).unwrap();

        assert_eq!(report.task_count, 2);
        assert_eq!(report.total_hours, 3.0);
        assert_eq!(report.tasks[0].task_name, "TaskX");
        assert_eq!(report.tasks[0].total_hours, 2.5);
        assert_eq!(report.tasks[1].task_name, "TaskY");
        assert_eq!(report.tasks[1].total_hours, 0.5);
    }

    #[test]
    fn human_output_lists_tasks_and_total() {
        let db = seeded_db();
        let report = generate(&db, day()).unwrap();
        let output = format_report(&report);

        assert!(output.starts_with("DAILY REPORT: 2024-02-01"));
        assert!(output.contains("TaskX"));
        assert!(output.contains("2.50"));
        assert!(output.contains("Total: 3.00h across 2 task(s)"));
    }

    #[test]
    fn open_entries_are_called_out() {
        let db = seeded_db();
        let x = db.find_task_by_name("TaskX").unwrap().unwrap();
        db.start_entry(x.id, ts(16, 0)).unwrap();

        let report = generate(&db, day()).unwrap();
        let output = format_report(&report);
        assert!(output.contains("(1 open)"), "open note missing: {output}");
    }

    #[test]
    fn empty_report_has_a_hint() {
        let db = Database::open_in_memory().unwrap();
        let report = generate(&db, day()).unwrap();
        let output = format_report(&report);
        insta::assert_snapshot!(output, @r"
        DAILY REPORT: 2024-02-01

        No entries recorded on 2024-02-01.

        Hint: Run 'ttr start <task>' to begin tracking.
        ");
    }

    #[test]
    fn json_output_round_trips() {
        let db = seeded_db();
        let mut output = Vec::new();
        run(&mut output, &db, day(), true).unwrap();

        let parsed: DailyReport = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed.date, day());
        assert_eq!(parsed.task_count, 2);
    }
}
