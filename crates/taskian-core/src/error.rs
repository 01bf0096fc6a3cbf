//! Error types surfaced by the list management engine.

use std::fmt;

use thiserror::Error;
use time::{Date, Weekday};

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Kind of item a position argument refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A task in the task store.
    Task,
    /// A goal in the goal store.
    Goal,
    /// A checklist item owned by a task.
    Subtask,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Task => "task",
            Self::Goal => "goal",
            Self::Subtask => "subtask",
        })
    }
}

/// Which undo buffer an operation targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    /// Tasks removed with `delete`.
    DeletedTasks,
    /// Tasks removed or rolled forward with `complete`.
    CompletedTasks,
    /// Goals removed with `delete`.
    DeletedGoals,
    /// Goals removed with `complete`.
    CompletedGoals,
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DeletedTasks => "deleted tasks",
            Self::CompletedTasks => "completed tasks",
            Self::DeletedGoals => "deleted goals",
            Self::CompletedGoals => "completed goals",
        })
    }
}

/// Errors returned by the task and goal stores.
///
/// All variants are recoverable: the store refuses the mutation and leaves
/// its contents untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A position does not correspond to a current item.
    #[error("no {kind} at position {position} (list has {len})")]
    OutOfRange {
        /// Kind of list that was indexed.
        kind: ItemKind,
        /// 1-based position supplied by the caller.
        position: usize,
        /// Current length of the list.
        len: usize,
    },

    /// A numeric field is outside its allowed domain.
    #[error("{field} must be between 0 and 100, got {value}")]
    InvalidRange {
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: i64,
    },

    /// The due date's weekday is not part of the task's weekday cycle.
    #[error("due date {date} is a {weekday}, which is not one of the repeat days")]
    ScheduleMismatch {
        /// Current due date of the task.
        date: Date,
        /// Weekday of that date.
        weekday: Weekday,
    },

    /// Undo requested with nothing buffered.
    #[error("nothing to restore from {0}")]
    EmptyCache(CacheKind),

    /// A recurrence rule could not be parsed.
    #[error("invalid repeat rule '{0}': expected a number of days or weekdays like mon,wed,fri")]
    InvalidRecurrence(String),
}

impl CoreError {
    pub(crate) const fn out_of_range(kind: ItemKind, position: usize, len: usize) -> Self {
        Self::OutOfRange {
            kind,
            position,
            len,
        }
    }
}

/// Translate a 1-based position into an index, validating it against `len`.
pub(crate) const fn index_for(kind: ItemKind, position: usize, len: usize) -> Result<usize> {
    if position == 0 || position > len {
        return Err(CoreError::out_of_range(kind, position, len));
    }
    Ok(position - 1)
}
