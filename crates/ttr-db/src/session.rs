//! Session lifecycle control on top of the store.
//!
//! The store exposes policy-neutral primitives; this module decides what
//! "start" means. Two policies exist because the tracker historically
//! supported both: an exclusive mode where starting a task silently stops
//! whatever else is running (switching tasks is one action), and a
//! per-task mode where distinct tasks may run concurrently. Exactly one
//! policy governs a running process.
//!
//! The controller keeps a `task_id -> entry_id` map of open entries for
//! cheap status display. The map is a derived cache, rebuilt from the
//! store on load and reconciled on every mutation; the store's open-entry
//! rows remain ground truth, so decisions always re-check the store.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use ttr_core::Entry;

use crate::{Database, DbError};

/// Which entries may be open at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePolicy {
    /// At most one open entry system-wide; starting a task stops the rest.
    Exclusive,
    /// At most one open entry per task; distinct tasks may run together.
    PerTask,
}

/// Result of asking the controller to start a task.
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    /// A new entry was opened; `stopped` lists entries closed to make
    /// room under the exclusive policy.
    Started { entry_id: i64, stopped: Vec<Entry> },
    /// The task already had an open entry; nothing changed.
    AlreadyActive { entry_id: i64 },
}

/// Enforces the active-session policy over the store.
#[derive(Debug)]
pub struct SessionController {
    policy: ActivePolicy,
    active: HashMap<i64, i64>,
}

impl SessionController {
    /// Builds a controller by scanning the store for open entries.
    ///
    /// Entries left open by a crash are picked up here, which is what
    /// makes them recoverable rather than corrupt.
    pub fn load(db: &Database, policy: ActivePolicy) -> Result<Self, DbError> {
        let mut controller = Self {
            policy,
            active: HashMap::new(),
        };
        controller.refresh(db)?;
        Ok(controller)
    }

    /// Rebuilds the active cache from store state.
    pub fn refresh(&mut self, db: &Database) -> Result<(), DbError> {
        self.active.clear();
        for row in db.active_entries()? {
            self.active.insert(row.entry.task_id, row.entry.id);
        }
        Ok(())
    }

    pub const fn policy(&self) -> ActivePolicy {
        self.policy
    }

    /// The cached `task_id -> entry_id` map of open entries.
    pub const fn active(&self) -> &HashMap<i64, i64> {
        &self.active
    }

    pub fn is_active(&self, task_id: i64) -> bool {
        self.active.contains_key(&task_id)
    }

    /// Starts a session for `task_id` at `at`.
    ///
    /// Starting an already-active task is a benign no-op reported as
    /// [`StartOutcome::AlreadyActive`]. Under [`ActivePolicy::Exclusive`]
    /// every other open entry is stopped first (auto-switch), so after a
    /// successful start exactly one entry is open system-wide.
    pub fn start(
        &mut self,
        db: &mut Database,
        task_id: i64,
        at: NaiveDateTime,
    ) -> Result<StartOutcome, DbError> {
        if let Some(open) = db.active_entry_for_task(task_id)? {
            self.active.insert(task_id, open.id);
            tracing::debug!(task_id, entry_id = open.id, "task already active");
            return Ok(StartOutcome::AlreadyActive { entry_id: open.id });
        }

        let stopped = match self.policy {
            ActivePolicy::Exclusive => {
                let mut stopped = Vec::new();
                for row in db.active_entries()? {
                    stopped.push(db.stop_entry(row.entry.id, at)?);
                }
                self.active.clear();
                stopped
            }
            ActivePolicy::PerTask => Vec::new(),
        };

        let entry_id = db.start_entry(task_id, at)?;
        self.active.insert(task_id, entry_id);
        tracing::debug!(
            task_id,
            entry_id,
            stopped = stopped.len(),
            "session started"
        );
        Ok(StartOutcome::Started { entry_id, stopped })
    }

    /// Stops the open session of `task_id`.
    ///
    /// Fails with [`DbError::TaskNotActive`] when the task has nothing
    /// running.
    pub fn stop_task(
        &mut self,
        db: &mut Database,
        task_id: i64,
        at: NaiveDateTime,
    ) -> Result<Entry, DbError> {
        let open = db
            .active_entry_for_task(task_id)?
            .ok_or(DbError::TaskNotActive(task_id))?;
        let entry = db.stop_entry(open.id, at)?;
        self.active.remove(&task_id);
        Ok(entry)
    }

    /// Stops a session addressed by entry id.
    pub fn stop_entry(
        &mut self,
        db: &mut Database,
        entry_id: i64,
        at: NaiveDateTime,
    ) -> Result<Entry, DbError> {
        let entry = db.stop_entry(entry_id, at)?;
        self.active.remove(&entry.task_id);
        Ok(entry)
    }

    /// Stops every open session, returning how many were closed.
    ///
    /// Zero is a normal outcome, not an error.
    pub fn pause_all(&mut self, db: &mut Database, at: NaiveDateTime) -> Result<usize, DbError> {
        let stopped = db.stop_all_active(at)?;
        self.active.clear();
        Ok(stopped)
    }
}
