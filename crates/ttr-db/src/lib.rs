//! Storage layer for the task time tracker.
//!
//! Provides persistence for tasks and entries using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. A `Database` instance can be moved between threads but cannot
//! be shared across threads without external synchronization. The tracker is
//! a single-process, single-logical-writer application, so no pooling is
//! needed; a periodic read-only refresh interleaves freely with writes
//! because every query re-derives its result from store state.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in ISO 8601 local time with second
//! precision (e.g., `2024-01-15T10:30:00`), so lexicographic ordering
//! matches chronological ordering. `date_key` is the `YYYY-MM-DD` bucket a
//! row is filed under, derived from the start timestamp.
//!
//! The `active` flag is kept strictly consistent with `end_ts IS NULL`:
//! every statement that closes an entry clears it, and the migration that
//! introduces the column defaults it to 0.
//!
//! # Durability
//!
//! Every mutating operation commits before returning; multi-row mutations
//! (stopping all open entries) run in one transaction. The worst case after
//! a crash is an entry left open with no end timestamp, which is a valid,
//! recoverable state surfaced by [`Database::active_entries`].

use std::collections::HashMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use ttr_core::entry::{DATE_FORMAT, date_key_for, duration_hours, format_ts, parse_ts};
use ttr_core::{Entry, EntryRow, Task, normalize_name};

pub mod session;

pub use session::{ActivePolicy, SessionController, StartOutcome};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A task name was empty after trimming.
    #[error(transparent)]
    EmptyTaskName(#[from] ttr_core::EmptyTaskName),
    /// The referenced task does not exist.
    #[error("no task with id {0}")]
    TaskNotFound(i64),
    /// The referenced entry does not exist.
    #[error("no entry with id {0}")]
    EntryNotFound(i64),
    /// The entry is already closed.
    #[error("entry {0} is not open")]
    EntryNotOpen(i64),
    /// The task has no open entry to stop.
    #[error("task {0} has no open entry")]
    TaskNotActive(i64),
    /// An end timestamp does not follow its start.
    #[error("end {end} does not follow start {start}")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// Failed to parse a stored entry timestamp.
    #[error("invalid timestamp for entry {entry_id}: {timestamp}")]
    TimestampParse {
        entry_id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// Failed to parse a stored date key.
    #[error("invalid date key for entry {entry_id}: {date_key}")]
    DateKeyParse {
        entry_id: i64,
        date_key: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        category TEXT DEFAULT 'General',
        important INTEGER DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS entries (
        id INTEGER PRIMARY KEY,
        task_id INTEGER NOT NULL,
        start_ts TEXT NOT NULL,
        end_ts TEXT,
        duration_h REAL DEFAULT 0,
        date_key TEXT NOT NULL,
        active INTEGER DEFAULT 0,
        FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
    );
";

// Created after migration so the `active` index is valid on legacy stores.
const INDEXES: &str = "
    CREATE INDEX IF NOT EXISTS idx_entries_date ON entries(date_key);
    CREATE INDEX IF NOT EXISTS idx_entries_active ON entries(active);
";

/// Columns selected for entry rows, in decode order.
const ENTRY_COLUMNS: &str = "id, task_id, start_ts, end_ts, duration_h, date_key, active";

/// An entry as read from the database, before timestamp decoding.
struct RawEntry {
    id: i64,
    task_id: i64,
    start_ts: String,
    end_ts: Option<String>,
    duration_h: f64,
    date_key: String,
    active: bool,
}

fn raw_entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        id: row.get(0)?,
        task_id: row.get(1)?,
        start_ts: row.get(2)?,
        end_ts: row.get(3)?,
        duration_h: row.get(4)?,
        date_key: row.get(5)?,
        active: row.get(6)?,
    })
}

fn decode_entry(raw: RawEntry) -> Result<Entry, DbError> {
    let start_ts = parse_ts(&raw.start_ts).map_err(|source| DbError::TimestampParse {
        entry_id: raw.id,
        timestamp: raw.start_ts.clone(),
        source,
    })?;
    let end_ts = raw
        .end_ts
        .as_deref()
        .map(|end| {
            parse_ts(end).map_err(|source| DbError::TimestampParse {
                entry_id: raw.id,
                timestamp: end.to_string(),
                source,
            })
        })
        .transpose()?;
    let date_key =
        NaiveDate::parse_from_str(&raw.date_key, DATE_FORMAT).map_err(|source| {
            DbError::DateKeyParse {
                entry_id: raw.id,
                date_key: raw.date_key.clone(),
                source,
            }
        })?;
    Ok(Entry {
        id: raw.id,
        task_id: raw.task_id,
        start_ts,
        end_ts,
        duration_h: raw.duration_h,
        date_key,
        active: raw.active,
    })
}

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        important: row.get(3)?,
    })
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is installed on first open; pre-existing stores receive
    /// additive migrations only (see [`Database::migrate`]).
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the schema and applies pending migrations.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(SCHEMA)?;
        self.migrate()?;
        self.conn.execute_batch(INDEXES)?;
        Ok(())
    }

    /// Applies additive migrations to a pre-existing store.
    ///
    /// Currently one migration exists: stores created before session
    /// tracking lack the `active` column on `entries`; it is added with
    /// default 0. Existing rows are never rewritten or dropped.
    fn migrate(&self) -> Result<(), DbError> {
        let mut stmt = self.conn.prepare("PRAGMA table_info(entries)")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        if !columns.iter().any(|c| c == "active") {
            self.conn
                .execute("ALTER TABLE entries ADD COLUMN active INTEGER DEFAULT 0", [])?;
            tracing::debug!("added entries.active column");
        }
        Ok(())
    }

    // ---- tasks ----

    /// Adds a task, returning its id.
    ///
    /// The name is trimmed first; an empty result is rejected. Adding a
    /// name that already exists returns the existing task's id without
    /// touching its category or importance - upsert-by-name is the
    /// conflict policy, not an error.
    pub fn add_task(
        &self,
        name: &str,
        category: Option<&str>,
        important: bool,
    ) -> Result<i64, DbError> {
        let name = normalize_name(name)?;
        let category = category.unwrap_or(ttr_core::DEFAULT_CATEGORY);
        let inserted = self.conn.execute(
            "INSERT INTO tasks (name, category, important) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO NOTHING",
            params![name, category, important],
        )?;
        if inserted == 1 {
            let id = self.conn.last_insert_rowid();
            tracing::debug!(id, %name, "task created");
            return Ok(id);
        }
        let id = self
            .conn
            .query_row("SELECT id FROM tasks WHERE name = ?1", [&name], |row| {
                row.get(0)
            })?;
        tracing::debug!(id, %name, "task already exists, reusing id");
        Ok(id)
    }

    /// Lists all tasks, important first, then by name.
    pub fn list_tasks(&self) -> Result<Vec<Task>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, category, important FROM tasks
             ORDER BY important DESC, name ASC",
        )?;
        let rows = stmt.query_map([], task_from_row)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// Fetches a task by id.
    pub fn get_task(&self, task_id: i64) -> Result<Task, DbError> {
        self.conn
            .query_row(
                "SELECT id, name, category, important FROM tasks WHERE id = ?1",
                [task_id],
                task_from_row,
            )
            .optional()?
            .ok_or(DbError::TaskNotFound(task_id))
    }

    /// Looks up a task by exact (trimmed) name.
    pub fn find_task_by_name(&self, name: &str) -> Result<Option<Task>, DbError> {
        let name = name.trim();
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, category, important FROM tasks WHERE name = ?1",
                [name],
                task_from_row,
            )
            .optional()?)
    }

    /// Sets or clears a task's importance flag.
    pub fn set_task_importance(&self, task_id: i64, important: bool) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE tasks SET important = ?1 WHERE id = ?2",
            params![important, task_id],
        )?;
        if updated == 0 {
            return Err(DbError::TaskNotFound(task_id));
        }
        tracing::debug!(task_id, important, "task importance updated");
        Ok(())
    }

    /// Deletes a task and, via the foreign key cascade, all its entries.
    pub fn remove_task(&self, task_id: i64) -> Result<(), DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", [task_id])?;
        if deleted == 0 {
            return Err(DbError::TaskNotFound(task_id));
        }
        tracing::debug!(task_id, "task removed with its entries");
        Ok(())
    }

    // ---- entry lifecycle ----

    /// Inserts a new open entry for a task, returning the entry id.
    ///
    /// The date key is derived from `at`'s calendar date. This is a
    /// policy-neutral primitive: exclusivity across tasks is enforced by
    /// [`SessionController`], not here.
    pub fn start_entry(&self, task_id: i64, at: NaiveDateTime) -> Result<i64, DbError> {
        self.ensure_task_exists(task_id)?;
        self.conn.execute(
            "INSERT INTO entries (task_id, start_ts, date_key, active) VALUES (?1, ?2, ?3, 1)",
            params![
                task_id,
                format_ts(at),
                date_key_for(at).format(DATE_FORMAT).to_string()
            ],
        )?;
        let entry_id = self.conn.last_insert_rowid();
        tracing::debug!(task_id, entry_id, "entry started");
        Ok(entry_id)
    }

    /// Closes a specific open entry at `at`, computing its duration.
    ///
    /// Fails with [`DbError::EntryNotOpen`] on an already-closed entry
    /// without touching the row, and with [`DbError::InvalidRange`] when
    /// `at` precedes the entry's start. A stop in the same second as the
    /// start is allowed and yields a zero-length entry.
    pub fn stop_entry(&self, entry_id: i64, at: NaiveDateTime) -> Result<Entry, DbError> {
        let mut entry = self.get_entry(entry_id)?;
        if entry.end_ts.is_some() {
            return Err(DbError::EntryNotOpen(entry_id));
        }
        if at < entry.start_ts {
            return Err(DbError::InvalidRange {
                start: entry.start_ts,
                end: at,
            });
        }
        let duration_h = duration_hours(entry.start_ts, at);
        self.conn.execute(
            "UPDATE entries SET end_ts = ?1, duration_h = ?2, active = 0 WHERE id = ?3",
            params![format_ts(at), duration_h, entry_id],
        )?;
        tracing::debug!(entry_id, duration_h, "entry stopped");
        entry.end_ts = Some(at);
        entry.duration_h = duration_h;
        entry.active = false;
        Ok(entry)
    }

    /// Closes every open entry at `at`, returning how many were closed.
    ///
    /// Runs in one transaction so a pause is all-or-nothing.
    pub fn stop_all_active(&mut self, at: NaiveDateTime) -> Result<usize, DbError> {
        let open: Vec<(i64, NaiveDateTime)> = {
            let mut stmt = self
                .conn
                .prepare("SELECT id, start_ts FROM entries WHERE active = 1")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;
            let mut open = Vec::new();
            for row in rows {
                let (id, start_raw) = row?;
                let start =
                    parse_ts(&start_raw).map_err(|source| DbError::TimestampParse {
                        entry_id: id,
                        timestamp: start_raw.clone(),
                        source,
                    })?;
                open.push((id, start));
            }
            open
        };

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE entries SET end_ts = ?1, duration_h = ?2, active = 0 WHERE id = ?3",
            )?;
            for &(id, start) in &open {
                if at < start {
                    return Err(DbError::InvalidRange { start, end: at });
                }
                stmt.execute(params![format_ts(at), duration_hours(start, at), id])?;
            }
        }
        tx.commit()?;
        tracing::debug!(count = open.len(), "all active entries stopped");
        Ok(open.len())
    }

    // ---- entry queries ----

    /// Fetches an entry by id.
    pub fn get_entry(&self, entry_id: i64) -> Result<Entry, DbError> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"),
                [entry_id],
                raw_entry_from_row,
            )
            .optional()?
            .ok_or(DbError::EntryNotFound(entry_id))?;
        decode_entry(raw)
    }

    /// Lists a day's entries joined with task columns.
    ///
    /// Ordered by task importance descending, then task name, then start
    /// time - the day-sheet order, distinct from report order.
    pub fn list_entries_for_date(&self, date: NaiveDate) -> Result<Vec<EntryRow>, DbError> {
        self.query_entry_rows(
            "WHERE e.date_key = ?1
             ORDER BY t.important DESC, t.name ASC, e.start_ts ASC",
            &[&date.format(DATE_FORMAT).to_string()],
        )
    }

    /// Lists every open entry with its task columns, oldest first.
    ///
    /// An entry left open by a crash shows up here and is treated as a
    /// valid, recoverable state.
    pub fn active_entries(&self) -> Result<Vec<EntryRow>, DbError> {
        self.query_entry_rows("WHERE e.active = 1 ORDER BY e.start_ts ASC", &[])
    }

    /// The open entry for a task, if any.
    ///
    /// Under the per-task policy each task has at most one; if several
    /// exist (e.g., rows predating policy enforcement), the oldest wins.
    pub fn active_entry_for_task(&self, task_id: i64) -> Result<Option<Entry>, DbError> {
        let raw = self
            .conn
            .query_row(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries
                     WHERE task_id = ?1 AND active = 1
                     ORDER BY start_ts ASC LIMIT 1"
                ),
                [task_id],
                raw_entry_from_row,
            )
            .optional()?;
        raw.map(decode_entry).transpose()
    }

    fn query_entry_rows(
        &self,
        tail: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<EntryRow>, DbError> {
        let sql = format!(
            "SELECT e.id, e.task_id, e.start_ts, e.end_ts, e.duration_h, e.date_key, e.active,
                    t.name, t.category, t.important
             FROM entries e
             JOIN tasks t ON t.id = e.task_id
             {tail}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, |row| {
            let raw = raw_entry_from_row(row)?;
            let task_name: String = row.get(7)?;
            let category: String = row.get(8)?;
            let important: bool = row.get(9)?;
            Ok((raw, task_name, category, important))
        })?;
        let mut entries = Vec::new();
        for row in rows {
            let (raw, task_name, category, important) = row?;
            entries.push(EntryRow {
                entry: decode_entry(raw)?,
                task_name,
                category,
                important,
            });
        }
        Ok(entries)
    }

    /// Every task paired with its entries for a date, including tasks
    /// that have none - the full day sheet.
    pub fn tasks_with_entries_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<(Task, Vec<Entry>)>, DbError> {
        let tasks = self.list_tasks()?;
        let rows = self.list_entries_for_date(date)?;

        let mut by_task: HashMap<i64, Vec<Entry>> = HashMap::new();
        for row in rows {
            by_task.entry(row.entry.task_id).or_default().push(row.entry);
        }

        Ok(tasks
            .into_iter()
            .map(|task| {
                let entries = by_task.remove(&task.id).unwrap_or_default();
                (task, entries)
            })
            .collect())
    }

    // ---- entry editing ----

    /// Rewrites an entry's interval, recomputing duration and date key.
    ///
    /// Both timestamps are required and `new_end` must strictly follow
    /// `new_start`; a rejected update leaves the row untouched. Editing
    /// cannot reopen an entry - the only path to an open entry is
    /// [`Database::start_entry`]. Editing the start across midnight
    /// refiles the entry under the new start's date. `new_task_id`
    /// optionally re-parents the entry.
    pub fn update_entry(
        &self,
        entry_id: i64,
        new_start: NaiveDateTime,
        new_end: NaiveDateTime,
        new_task_id: Option<i64>,
    ) -> Result<Entry, DbError> {
        let entry = self.get_entry(entry_id)?;
        if new_end <= new_start {
            return Err(DbError::InvalidRange {
                start: new_start,
                end: new_end,
            });
        }
        let task_id = match new_task_id {
            Some(task_id) => {
                self.ensure_task_exists(task_id)?;
                task_id
            }
            None => entry.task_id,
        };
        let duration_h = duration_hours(new_start, new_end);
        let date_key = date_key_for(new_start);
        self.conn.execute(
            "UPDATE entries
             SET task_id = ?1, start_ts = ?2, end_ts = ?3, duration_h = ?4,
                 date_key = ?5, active = 0
             WHERE id = ?6",
            params![
                task_id,
                format_ts(new_start),
                format_ts(new_end),
                duration_h,
                date_key.format(DATE_FORMAT).to_string(),
                entry_id
            ],
        )?;
        tracing::debug!(entry_id, duration_h, "entry updated");
        Ok(Entry {
            id: entry_id,
            task_id,
            start_ts: new_start,
            end_ts: Some(new_end),
            duration_h,
            date_key,
            active: false,
        })
    }

    /// Hard-deletes an entry.
    pub fn delete_entry(&self, entry_id: i64) -> Result<(), DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM entries WHERE id = ?1", [entry_id])?;
        if deleted == 0 {
            return Err(DbError::EntryNotFound(entry_id));
        }
        tracing::debug!(entry_id, "entry deleted");
        Ok(())
    }

    /// Inserts a zero-duration closed placeholder entry at midnight of
    /// `date`, returning its id.
    ///
    /// Used to surface a task on a day's sheet without timing it.
    pub fn add_empty_entry(&self, task_id: i64, date: NaiveDate) -> Result<i64, DbError> {
        self.ensure_task_exists(task_id)?;
        let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is always valid");
        let ts = format_ts(midnight);
        self.conn.execute(
            "INSERT INTO entries (task_id, start_ts, end_ts, duration_h, date_key, active)
             VALUES (?1, ?2, ?3, 0, ?4, 0)",
            params![task_id, ts, ts, date.format(DATE_FORMAT).to_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn ensure_task_exists(&self, task_id: i64) -> Result<(), DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE id = ?1",
            [task_id],
            |row| row.get(0),
        )?;
        if count == 0 {
            return Err(DbError::TaskNotFound(task_id));
        }
        Ok(())
    }
}
