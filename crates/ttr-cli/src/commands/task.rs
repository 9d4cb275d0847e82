//! Task management commands: add, list, mark, remove.

use std::io::Write;

use anyhow::Result;

use ttr_db::Database;

use super::util::resolve_task;

/// Adds a task, reporting whether it already existed.
pub fn add(
    db: &Database,
    name: &str,
    category: Option<&str>,
    important: bool,
) -> Result<()> {
    let existing = db.find_task_by_name(name)?;
    let id = db.add_task(name, category, important)?;
    match existing {
        Some(task) => println!("Task '{}' already exists (id {id})", task.name),
        None => println!("Added task '{}' (id {id})", name.trim()),
    }
    Ok(())
}

/// Lists all tasks, important first.
pub fn list<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let tasks = db.list_tasks()?;
    if tasks.is_empty() {
        writeln!(writer, "No tasks yet.")?;
        writeln!(writer, "Hint: Run 'ttr task add <name>' or 'ttr start <name>'.")?;
        return Ok(());
    }

    writeln!(writer, "{:>4}  {:<2}  {:<28}  Category", "ID", "W", "Name")?;
    for task in tasks {
        let flag = if task.important { "*" } else { "" };
        writeln!(
            writer,
            "{:>4}  {:<2}  {:<28}  {}",
            task.id, flag, task.name, task.category
        )?;
    }
    Ok(())
}

/// Sets or clears the importance flag of a task addressed by name.
pub fn mark(db: &Database, name: &str, unset: bool) -> Result<()> {
    let task = resolve_task(db, name)?;
    db.set_task_importance(task.id, !unset)?;
    if unset {
        println!("Cleared importance of '{}'", task.name);
    } else {
        println!("Marked '{}' as important", task.name);
    }
    Ok(())
}

/// Removes a task and all its entries.
pub fn remove(db: &Database, name: &str) -> Result<()> {
    let task = resolve_task(db, name)?;
    db.remove_task(task.id)?;
    println!("Removed task '{}' and its entries", task.name);
    Ok(())
}
