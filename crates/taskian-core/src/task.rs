//! Due-date ordered task store.

use serde::{Deserialize, Serialize};
use time::Date;
use tracing::debug;

use crate::error::{ItemKind, Result, index_for};
use crate::id::RecordKey;
use crate::recurrence::Recurrence;
use crate::subtask::SubtaskList;
use crate::undo::{Restore, Snapshot};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// A dated task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable identity.
    #[serde(default = "RecordKey::new")]
    pub key: RecordKey,
    /// 1-based display position, recomputed after every store mutation.
    #[serde(default)]
    pub id: usize,
    /// Free-form description.
    pub description: String,
    /// Calendar day the task is due.
    #[serde(with = "iso_date")]
    pub due: Date,
    /// Repeat rule applied on completion.
    #[serde(default)]
    pub recurrence: Recurrence,
    /// Checklist owned by this task.
    #[serde(default)]
    pub subtasks: SubtaskList,
}

impl Task {
    /// Create a task with a fresh key and no subtasks.
    pub fn new(description: impl Into<String>, due: Date, recurrence: Recurrence) -> Self {
        Self {
            key: RecordKey::new(),
            id: 0,
            description: description.into(),
            due,
            recurrence,
            subtasks: SubtaskList::default(),
        }
    }
}

/// Outcome of completing a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A one-off task left the store.
    Removed(Task),
    /// A recurring task stayed live with a new due date.
    Rolled {
        /// The task as it was before completion.
        snapshot: Task,
        /// Due date after rolling forward.
        next_due: Date,
    },
}

impl Completion {
    /// The pre-completion record, suitable for the completed-tasks cache.
    #[must_use]
    pub const fn snapshot(&self) -> &Task {
        match self {
            Self::Removed(task) | Self::Rolled { snapshot: task, .. } => task,
        }
    }

    /// Consume the outcome, keeping only the pre-completion record.
    #[must_use]
    pub fn into_snapshot(self) -> Task {
        match self {
            Self::Removed(task) | Self::Rolled { snapshot: task, .. } => task,
        }
    }
}

/// Tasks sorted ascending by due date; ties keep their previous order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    /// Build a store from loaded records, establishing order and ids.
    #[must_use]
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut store = Self { tasks };
        store.reorder();
        store
    }

    /// Tasks in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of live tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when no task is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Task at a 1-based position.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn get(&self, position: usize) -> Result<&Task> {
        let idx = self.index(position)?;
        Ok(&self.tasks[idx])
    }

    /// Current 1-based position of the task with `key`.
    #[must_use]
    pub fn position_of(&self, key: RecordKey) -> Option<usize> {
        self.tasks.iter().position(|task| task.key == key).map(|idx| idx + 1)
    }

    /// Append a new task and return its position after re-sorting.
    pub fn add(&mut self, description: impl Into<String>, due: Date, recurrence: Recurrence) -> usize {
        self.insert(Task::new(description, due, recurrence))
    }

    /// Append an existing record and return its position after re-sorting.
    pub fn insert(&mut self, task: Task) -> usize {
        let key = task.key;
        debug!(%key, due = %task.due, "Adding task");
        self.tasks.push(task);
        self.reorder();
        self.position_of(key).unwrap_or(self.tasks.len())
    }

    /// Remove the task at `position` and return it.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn delete(&mut self, position: usize) -> Result<Task> {
        let idx = self.index(position)?;
        let removed = self.tasks.remove(idx);
        self.renumber();
        debug!(key = %removed.key, position, "Deleted task");
        Ok(removed)
    }

    /// Complete the task at `position`.
    ///
    /// One-off tasks are removed. Recurring tasks roll forward to their next
    /// due date with every subtask reopened.
    ///
    /// # Errors
    /// Returns `OutOfRange` for an invalid position and `ScheduleMismatch`
    /// when a weekday cycle does not contain the due date's weekday. The
    /// store is unchanged on error.
    pub fn complete(&mut self, position: usize) -> Result<Completion> {
        let idx = self.index(position)?;
        self.complete_at(idx)
    }

    /// Complete the task identified by `key`. `None` when no live task has it.
    pub fn complete_by_key(&mut self, key: RecordKey) -> Option<Result<Completion>> {
        let idx = self.tasks.iter().position(|task| task.key == key)?;
        Some(self.complete_at(idx))
    }

    fn complete_at(&mut self, idx: usize) -> Result<Completion> {
        let current = &self.tasks[idx];
        let Some(next_due) = current.recurrence.advance(current.due)? else {
            let removed = self.tasks.remove(idx);
            self.renumber();
            debug!(key = %removed.key, "Completed one-off task");
            return Ok(Completion::Removed(removed));
        };

        let snapshot = self.tasks[idx].clone();
        let task = &mut self.tasks[idx];
        task.due = next_due;
        task.subtasks.reset_all();
        debug!(key = %task.key, from = %snapshot.due, to = %next_due, "Rolled recurring task");
        self.reorder();
        Ok(Completion::Rolled { snapshot, next_due })
    }

    /// Replace the description of the task at `position`.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn edit(&mut self, position: usize, description: impl Into<String>) -> Result<()> {
        self.task_mut(position)?.description = description.into();
        Ok(())
    }

    /// Move the task at `position` to a new due date and re-sort.
    ///
    /// Returns the task's new position.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn reschedule(&mut self, position: usize, due: Date) -> Result<usize> {
        let task = self.task_mut(position)?;
        task.due = due;
        let key = task.key;
        self.reorder();
        Ok(self.position_of(key).unwrap_or(position))
    }

    /// Attach a repeat rule to the task at `position`.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn set_recurrence(&mut self, position: usize, rule: Recurrence) -> Result<()> {
        self.task_mut(position)?.recurrence = rule;
        Ok(())
    }

    /// Make the task at `position` a one-off task again.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn clear_recurrence(&mut self, position: usize) -> Result<()> {
        self.set_recurrence(position, Recurrence::None)
    }

    /// Append a subtask to the task at `position`.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn add_subtask(&mut self, position: usize, description: impl Into<String>) -> Result<()> {
        self.task_mut(position)?.subtasks.add(description);
        Ok(())
    }

    /// Check off a subtask.
    ///
    /// # Errors
    /// Returns `OutOfRange` for an invalid task or subtask position.
    pub fn complete_subtask(&mut self, position: usize, subtask: usize) -> Result<()> {
        self.task_mut(position)?.subtasks.complete(subtask)
    }

    /// Reopen a checked-off subtask.
    ///
    /// # Errors
    /// Returns `OutOfRange` for an invalid task or subtask position.
    pub fn uncomplete_subtask(&mut self, position: usize, subtask: usize) -> Result<()> {
        self.task_mut(position)?.subtasks.uncomplete(subtask)
    }

    /// Remove a subtask.
    ///
    /// # Errors
    /// Returns `OutOfRange` for an invalid task or subtask position.
    pub fn delete_subtask(&mut self, position: usize, subtask: usize) -> Result<()> {
        self.task_mut(position)?.subtasks.delete(subtask).map(drop)
    }

    /// Replace a subtask's description.
    ///
    /// # Errors
    /// Returns `OutOfRange` for an invalid task or subtask position.
    pub fn edit_subtask(
        &mut self,
        position: usize,
        subtask: usize,
        description: impl Into<String>,
    ) -> Result<()> {
        self.task_mut(position)?.subtasks.edit(subtask, description)
    }

    /// Drop every task and return how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.tasks.len();
        self.tasks.clear();
        debug!(removed, "Cleared task store");
        removed
    }

    /// Tasks due exactly on `today`.
    pub fn due_on(&self, today: Date) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |task| task.due == today)
    }

    /// Tasks due before `today`, paired with how many days late they are.
    pub fn overdue(&self, today: Date) -> impl Iterator<Item = (&Task, i64)> {
        self.tasks
            .iter()
            .filter(move |task| task.due < today)
            .map(move |task| (task, (today - task.due).whole_days()))
    }

    /// Tasks due exactly one day after `today`.
    pub fn due_tomorrow(&self, today: Date) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(move |task| (task.due - today).whole_days() == 1)
    }

    /// Tasks due more than one day after `today`, paired with days remaining.
    pub fn future(&self, today: Date) -> impl Iterator<Item = (&Task, i64)> {
        self.tasks
            .iter()
            .map(move |task| (task, (task.due - today).whole_days()))
            .filter(|(_, days)| *days > 1)
    }

    /// Keys of every task due on `today`, in display order.
    #[must_use]
    pub fn keys_due_on(&self, today: Date) -> Vec<RecordKey> {
        self.due_on(today).map(|task| task.key).collect()
    }

    /// Put back the pre-completion copy of a task. A live task with the same
    /// key (the rolled instance of a recurring task) is dropped first.
    pub fn replace_or_insert(&mut self, snapshot: Snapshot<Task>) -> usize {
        let key = snapshot.record.key;
        if let Some(idx) = self.tasks.iter().position(|task| task.key == key) {
            self.tasks.remove(idx);
            debug!(%key, "Dropped rolled instance before restore");
        }
        self.insert_snapshot(snapshot)
    }

    fn insert_snapshot(&mut self, snapshot: Snapshot<Task>) -> usize {
        let Snapshot { record, origin } = snapshot;
        let key = record.key;
        let idx = origin.min(self.tasks.len());
        self.tasks.insert(idx, record);
        self.reorder();
        self.position_of(key).unwrap_or(self.tasks.len())
    }

    fn index(&self, position: usize) -> Result<usize> {
        index_for(ItemKind::Task, position, self.tasks.len())
    }

    fn task_mut(&mut self, position: usize) -> Result<&mut Task> {
        let idx = self.index(position)?;
        Ok(&mut self.tasks[idx])
    }

    fn reorder(&mut self) {
        self.tasks.sort_by_key(|task| task.due);
        self.renumber();
    }

    fn renumber(&mut self) {
        for (idx, task) in self.tasks.iter_mut().enumerate() {
            task.id = idx + 1;
        }
    }
}

impl Restore<Task> for TaskStore {
    /// Put a cached task back next to whatever is live. If its key is already
    /// taken the restored copy gets a fresh one.
    fn restore(&mut self, mut snapshot: Snapshot<Task>) -> usize {
        if self.position_of(snapshot.record.key).is_some() {
            let key = RecordKey::new();
            debug!(old = %snapshot.record.key, new = %key, "Re-keyed restored task");
            snapshot.record.key = key;
        }
        self.insert_snapshot(snapshot)
    }
}
