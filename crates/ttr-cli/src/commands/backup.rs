//! Backup command: timestamped copy of the database file.
//!
//! A backup is a plain file copy - SQLite keeps the store in one file and
//! every mutation commits before returning, so copying the file outside a
//! write yields a consistent snapshot for this single-writer application.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

/// Copies `database_path` into `backup_dir` with a timestamped name.
///
/// With `max_age_days` set, the copy is skipped when the newest existing
/// backup is younger than that many days; returns `None` in that case.
pub fn run(
    database_path: &Path,
    backup_dir: &Path,
    max_age_days: Option<u64>,
    now: NaiveDateTime,
) -> Result<Option<PathBuf>> {
    anyhow::ensure!(
        database_path.exists(),
        "database not found: {}",
        database_path.display()
    );
    fs::create_dir_all(backup_dir)
        .with_context(|| format!("failed to create {}", backup_dir.display()))?;

    if let Some(days) = max_age_days {
        if let Some(age) = newest_backup_age(backup_dir)? {
            let threshold = Duration::from_secs(days * 24 * 60 * 60);
            if age < threshold {
                tracing::debug!(?age, "newest backup is recent, skipping");
                return Ok(None);
            }
        }
    }

    let dest = backup_dir.join(format!("ttr-{}.db", now.format("%Y%m%d-%H%M%S")));
    fs::copy(database_path, &dest)
        .with_context(|| format!("failed to copy database to {}", dest.display()))?;
    Ok(Some(dest))
}

/// Age of the newest file in the backup directory, if any.
fn newest_backup_age(backup_dir: &Path) -> Result<Option<Duration>> {
    let mut newest: Option<SystemTime> = None;
    for dir_entry in fs::read_dir(backup_dir)? {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_file() {
            continue;
        }
        let modified = dir_entry.metadata()?.modified()?;
        if newest.is_none_or(|current| modified > current) {
            newest = Some(modified);
        }
    }
    Ok(newest.map(|modified| {
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO)
    }))
}
