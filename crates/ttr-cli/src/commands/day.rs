//! Day listing: the entries of one calendar day.

use std::io::Write;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};

use ttr_core::EntryRow;
use ttr_db::Database;

/// Formats one day's entries as a fixed-width sheet.
///
/// Open entries show a live elapsed value against `now`, marked with `+`
/// so they cannot be mistaken for closed totals.
pub fn format_day(date: NaiveDate, rows: &[EntryRow], now: NaiveDateTime) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    writeln!(output, "ENTRIES: {date}").unwrap();

    if rows.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No entries recorded on {date}.").unwrap();
        return output;
    }

    writeln!(output).unwrap();
    writeln!(
        output,
        "{:>4}  {:<22}  {:<2}  {:<8}  {:<8}  {:>7}",
        "ID", "Task", "W", "Start", "End", "Hours"
    )
    .unwrap();
    for row in rows {
        let flag = if row.important { "*" } else { "" };
        let start = row.entry.start_ts.format("%H:%M:%S").to_string();
        let end = row
            .entry
            .end_ts
            .map_or_else(|| "-".to_string(), |e| e.format("%H:%M:%S").to_string());
        let hours = if row.entry.is_open() {
            format!("{:.2}+", row.entry.display_hours(now))
        } else {
            format!("{:.2}", row.entry.duration_h)
        };
        writeln!(
            output,
            "{:>4}  {:<22}  {:<2}  {:<8}  {:<8}  {:>7}",
            row.entry.id, row.task_name, flag, start, end, hours
        )
        .unwrap();
    }
    output
}

/// Runs the day command.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<()> {
    let rows = db.list_entries_for_date(date)?;
    write!(writer, "{}", format_day(date, &rows, now))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn empty_day_prints_a_notice() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let output = format_day(date, &[], ts(12, 0));
        insta::assert_snapshot!(output, @r"
        ENTRIES: 2024-02-01

        No entries recorded on 2024-02-01.
        ");
    }

    #[test]
    fn open_entries_are_marked() {
        let db = Database::open_in_memory().unwrap();
        let task = db.add_task("ongoing", None, false).unwrap();
        db.start_entry(task, ts(9, 0)).unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let rows = db.list_entries_for_date(date).unwrap();
        let output = format_day(date, &rows, ts(10, 30));

        assert!(output.contains("1.50+"), "live hours marked: {output}");
        assert!(output.contains('-'), "open entries have no end time");
    }

    #[test]
    fn closed_entries_show_their_interval() {
        let db = Database::open_in_memory().unwrap();
        let task = db.add_task("done", None, true).unwrap();
        let id = db.start_entry(task, ts(9, 0)).unwrap();
        db.stop_entry(id, ts(9, 45)).unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let rows = db.list_entries_for_date(date).unwrap();
        let output = format_day(date, &rows, ts(23, 0));

        assert!(output.contains("09:00:00"));
        assert!(output.contains("09:45:00"));
        assert!(output.contains("0.75"));
        assert!(output.contains('*'), "importance flag rendered");
    }
}
