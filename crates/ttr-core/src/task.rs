//! Task records and name validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category assigned to tasks created without an explicit one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Returned when a task name is empty after trimming.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("task name cannot be empty")]
pub struct EmptyTaskName;

/// Trims a raw task name, rejecting names that are empty afterwards.
///
/// Names are case-sensitive; no further normalization is applied.
pub fn normalize_name(raw: &str) -> Result<String, EmptyTaskName> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EmptyTaskName);
    }
    Ok(trimmed.to_string())
}

/// A task users log time against.
///
/// Tasks are never deleted automatically; removing one cascades to its
/// entries at the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub category: String,
    /// The "W" flag: important tasks sort first and can be filtered
    /// into their own export.
    pub important: bool,
}
