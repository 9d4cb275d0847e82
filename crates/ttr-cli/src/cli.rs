//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Task-based personal time tracker.
///
/// Define tasks, start and stop timed sessions against them, and review
/// per-day summaries.
#[derive(Debug, Parser)]
#[command(name = "ttr", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database file, overriding the configured one.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Start timing a task, creating it on first use.
    Start {
        /// Task name.
        task: String,
    },

    /// Stop a running session.
    Stop {
        /// Task name; omit to stop the only running session.
        task: Option<String>,
    },

    /// Stop every running session.
    Pause,

    /// Show running sessions and today's sheet.
    Status,

    /// List the entries of a day.
    Day {
        /// Day to list (YYYY-MM-DD, default today).
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Per-task totals for a day.
    Report {
        /// Day to report on (YYYY-MM-DD, default today).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Emit JSON instead of the human-readable report.
        #[arg(long)]
        json: bool,
    },

    /// Export a day's summary as CSV.
    Export {
        /// Day to export (YYYY-MM-DD, default today).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output file; omit to write to stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Only include tasks flagged important.
        #[arg(long)]
        important_only: bool,
    },

    /// Edit or delete individual entries.
    Entry {
        #[command(subcommand)]
        action: EntryAction,
    },

    /// Copy the database into the backup directory.
    Backup {
        /// Backup directory, overriding the configured one.
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Skip the copy if the newest backup is younger than this many days.
        #[arg(long)]
        max_age_days: Option<u64>,
    },
}

/// Task management subcommands.
#[derive(Debug, Subcommand)]
pub enum TaskAction {
    /// Add a task.
    Add {
        /// Task name (trimmed; must be non-empty).
        name: String,

        /// Category label.
        #[arg(long)]
        category: Option<String>,

        /// Flag the task as important.
        #[arg(long)]
        important: bool,
    },

    /// List all tasks, important first.
    List,

    /// Set or clear a task's importance flag.
    Mark {
        /// Task name.
        task: String,

        /// Clear the flag instead of setting it.
        #[arg(long)]
        unset: bool,
    },

    /// Remove a task and all its entries.
    Rm {
        /// Task name.
        task: String,
    },
}

/// Entry editing subcommands.
#[derive(Debug, Subcommand)]
pub enum EntryAction {
    /// Rewrite an entry's interval (and optionally its task).
    Edit {
        /// Entry id.
        id: i64,

        /// New start timestamp (e.g. 2024-01-15T09:00:00).
        #[arg(long)]
        start: String,

        /// New end timestamp; must follow the start.
        #[arg(long)]
        end: String,

        /// Move the entry to another task.
        #[arg(long)]
        task: Option<String>,
    },

    /// Delete an entry.
    Del {
        /// Entry id.
        id: i64,
    },

    /// Add a zero-duration placeholder entry for a task on a day.
    AddEmpty {
        /// Task name.
        task: String,

        /// Day to file it under (YYYY-MM-DD, default today).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}
