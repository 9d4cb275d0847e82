//! Status command: running sessions and today's sheet.
//!
//! This is the read-only refresh view: everything shown is re-derived
//! from store state on each invocation, so a shell timer can re-run it
//! on any cadence and interleave freely with writes.

use std::io::Write;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};

use ttr_db::Database;

use super::day::format_day;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    today: NaiveDate,
    now: NaiveDateTime,
) -> Result<()> {
    let active = db.active_entries()?;

    if active.is_empty() {
        writeln!(writer, "Nothing is running.")?;
    } else {
        writeln!(writer, "Running:")?;
        for row in &active {
            writeln!(
                writer,
                "- {} since {} ({:.2}h)",
                row.task_name,
                row.entry.start_ts.format("%H:%M:%S"),
                row.entry.display_hours(now)
            )?;
        }
    }

    writeln!(writer)?;
    write!(
        writer,
        "{}",
        format_day(today, &db.list_entries_for_date(today)?, now)
    )?;
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

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    #[test]
    fn shows_running_sessions_with_live_hours() {
        let db = Database::open_in_memory().unwrap();
        let task = db.add_task("writing", None, false).unwrap();
        db.start_entry(task, ts(9, 0)).unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, day(), ts(10, 30)).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("Running:"));
        assert!(output.contains("- writing since 09:00:00 (1.50h)"));
        assert!(output.contains("ENTRIES: 2024-02-01"));
    }

    #[test]
    fn quiet_when_nothing_is_running() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        run(&mut output, &db, day(), ts(10, 0)).unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.starts_with("Nothing is running."));
        assert!(output.contains("No entries recorded on 2024-02-01."));
    }
}
