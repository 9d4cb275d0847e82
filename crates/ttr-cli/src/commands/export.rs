//! Export command: a day's summary as CSV.
//!
//! This is the tabular sink the report hands its summary rows to. The
//! shape is one row per task plus a trailing total row; the `important`
//! column is blank on the total.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use ttr_core::{SummaryRow, summary_rows};
use ttr_db::Database;

use super::report::generate;

/// Serializes summary rows as CSV into any writer.
pub fn write_csv<W: Write>(writer: W, rows: &[SummaryRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["task", "important", "hours"])?;
    for row in rows {
        let important = match row.important {
            Some(true) => "1",
            Some(false) => "0",
            None => "",
        };
        let hours = format!("{:.2}", row.hours);
        wtr.write_record([row.task.as_str(), important, hours.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Runs the export command, writing to `out` or stdout.
pub fn run(
    db: &Database,
    date: NaiveDate,
    out: Option<&Path>,
    important_only: bool,
) -> Result<()> {
    let report = generate(db, date)?;
    let rows = summary_rows(&report, important_only);

    match out {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_csv(file, &rows)?;
            println!("Exported {} row(s) to {}", rows.len(), path.display());
        }
        None => write_csv(std::io::stdout().lock(), &rows)?,
    }
    Ok(())
}
