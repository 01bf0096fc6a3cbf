//! List management engine for taskian: tasks, goals, recurrence, and undo.

/// Error types.
pub mod error;
/// Goal store.
pub mod goal;
/// Identifier types.
pub mod id;
/// Recurrence rules and the repeat scheduler.
pub mod recurrence;
/// Subtask checklists.
pub mod subtask;
/// Task store.
pub mod task;
/// Undo caches.
pub mod undo;

pub use error::{CacheKind, CoreError, ItemKind, Result};
pub use goal::{Goal, GoalStore, PROGRESS_SEGMENTS};
pub use id::RecordKey;
pub use recurrence::{Recurrence, next_due, parse_weekday, weekday_token};
pub use subtask::{Subtask, SubtaskList};
pub use task::{Completion, Task, TaskStore};
pub use undo::{DEFAULT_UNDO_DEPTH, Restore, Snapshot, UndoCache};
