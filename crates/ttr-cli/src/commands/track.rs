//! Session commands: start, stop, pause.

use anyhow::Result;
use chrono::NaiveDateTime;

use ttr_db::{Database, SessionController, StartOutcome};

use super::util::resolve_task;

/// Starts timing a task, creating the task on first use.
pub fn start(
    db: &mut Database,
    controller: &mut SessionController,
    name: &str,
    at: NaiveDateTime,
) -> Result<()> {
    // Implicit task creation: starting an unknown name defines it.
    let task_id = db.add_task(name, None, false)?;
    match controller.start(db, task_id, at)? {
        StartOutcome::Started { entry_id, stopped } => {
            for entry in &stopped {
                let stopped_name = db.get_task(entry.task_id)?.name;
                println!("Stopped '{stopped_name}' at {:.2}h", entry.duration_h);
            }
            println!("Started '{}' (entry {entry_id})", name.trim());
        }
        StartOutcome::AlreadyActive { entry_id } => {
            println!("'{}' is already running (entry {entry_id})", name.trim());
        }
    }
    Ok(())
}

/// Stops the session of a named task, or the only running session.
pub fn stop(
    db: &mut Database,
    controller: &mut SessionController,
    name: Option<&str>,
    at: NaiveDateTime,
) -> Result<()> {
    let task = match name {
        Some(name) => resolve_task(db, name)?,
        None => {
            let active = db.active_entries()?;
            match active.len() {
                0 => {
                    println!("Nothing is running.");
                    return Ok(());
                }
                1 => db.get_task(active[0].entry.task_id)?,
                _ => {
                    let names: Vec<String> =
                        active.iter().map(|row| row.task_name.clone()).collect();
                    anyhow::bail!(
                        "several sessions are running ({}); name the task to stop",
                        names.join(", ")
                    );
                }
            }
        }
    };

    let entry = controller.stop_task(db, task.id, at)?;
    println!("Stopped '{}' at {:.2}h", task.name, entry.duration_h);
    Ok(())
}

/// Stops every running session.
pub fn pause(db: &mut Database, controller: &mut SessionController, at: NaiveDateTime) -> Result<()> {
    let stopped = controller.pause_all(db, at)?;
    if stopped == 0 {
        println!("Nothing is running.");
    } else {
        println!("Stopped {stopped} session(s).");
    }
    Ok(())
}
