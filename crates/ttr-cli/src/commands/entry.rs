//! Entry editing commands: edit, delete, placeholder rows.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use ttr_db::Database;

use super::util::{parse_datetime, resolve_task};

/// Rewrites an entry's interval and optionally moves it to another task.
///
/// The store recomputes the duration and refiles the entry under the new
/// start's date, so an edit across midnight moves it to that day's sheet.
pub fn edit(
    db: &Database,
    entry_id: i64,
    start: &str,
    end: &str,
    task: Option<&str>,
) -> Result<()> {
    let new_start = parse_datetime(start).context("invalid --start")?;
    let new_end = parse_datetime(end).context("invalid --end")?;
    let new_task_id = task
        .map(|name| resolve_task(db, name).map(|t| t.id))
        .transpose()?;

    let entry = db.update_entry(entry_id, new_start, new_end, new_task_id)?;
    println!(
        "Updated entry {entry_id}: {:.2}h on {}",
        entry.duration_h, entry.date_key
    );
    Ok(())
}

/// Deletes an entry outright.
pub fn delete(db: &Database, entry_id: i64) -> Result<()> {
    db.delete_entry(entry_id)?;
    println!("Deleted entry {entry_id}");
    Ok(())
}

/// Adds a zero-duration placeholder entry so a task appears on a day's
/// sheet without being timed.
pub fn add_empty(db: &Database, task: &str, date: NaiveDate) -> Result<()> {
    let task = resolve_task(db, task)?;
    let entry_id = db.add_empty_entry(task.id, date)?;
    println!("Added placeholder entry {entry_id} for '{}' on {date}", task.name);
    Ok(())
}
