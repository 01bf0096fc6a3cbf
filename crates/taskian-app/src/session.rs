//! Session context: live stores, their undo buffers, and the current date.

use taskian_core::{
    CacheKind, Completion, CoreError, Goal, GoalStore, Recurrence, Result, Task, TaskStore, UndoCache,
};
use taskian_store::{STATE_VERSION, SessionState, UndoState};
use time::{Date, OffsetDateTime};
use tracing::{debug, warn};

use crate::config::AppConfig;

/// Today's date in the local time zone, or in UTC when the local offset
/// cannot be determined.
#[must_use]
pub fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|err| {
            debug!(%err, "Local offset unavailable, falling back to UTC");
            OffsetDateTime::now_utc()
        })
        .date()
}

/// Result of completing every task due today.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Completions in the order they were applied.
    pub completed: Vec<Completion>,
    /// Tasks that could not be completed, left untouched.
    pub failed: Vec<(Task, CoreError)>,
}

/// Everything one run of the program works on.
#[derive(Debug)]
pub struct Session {
    today: Date,
    tasks: TaskStore,
    goals: GoalStore,
    deleted_tasks: UndoCache<Task>,
    completed_tasks: UndoCache<Task>,
    deleted_goals: UndoCache<Goal>,
    completed_goals: UndoCache<Goal>,
}

impl Session {
    /// Empty session pinned to `today`.
    #[must_use]
    pub fn new(today: Date, undo_depth: usize) -> Self {
        Self::open(SessionState::default(), today, undo_depth)
    }

    /// Rebuild a session from persisted state.
    #[must_use]
    pub fn open(state: SessionState, today: Date, undo_depth: usize) -> Self {
        let SessionState {
            tasks, goals, undo, ..
        } = state;
        Self {
            today,
            tasks: TaskStore::from_tasks(tasks),
            goals: GoalStore::from_goals(goals),
            deleted_tasks: UndoCache::from_entries(CacheKind::DeletedTasks, undo_depth, undo.deleted_tasks),
            completed_tasks: UndoCache::from_entries(
                CacheKind::CompletedTasks,
                undo_depth,
                undo.completed_tasks,
            ),
            deleted_goals: UndoCache::from_entries(CacheKind::DeletedGoals, undo_depth, undo.deleted_goals),
            completed_goals: UndoCache::from_entries(
                CacheKind::CompletedGoals,
                undo_depth,
                undo.completed_goals,
            ),
        }
    }

    /// Rebuild a session using the depth from `config`.
    #[must_use]
    pub fn with_config(state: SessionState, today: Date, config: &AppConfig) -> Self {
        Self::open(state, today, config.undo_depth)
    }

    /// Capture everything that should survive to the next run.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        SessionState {
            version: STATE_VERSION,
            tasks: self.tasks.tasks().to_vec(),
            goals: self.goals.goals().to_vec(),
            undo: UndoState {
                deleted_tasks: self.deleted_tasks.entries().to_vec(),
                completed_tasks: self.completed_tasks.entries().to_vec(),
                deleted_goals: self.deleted_goals.entries().to_vec(),
                completed_goals: self.completed_goals.entries().to_vec(),
            },
        }
    }

    /// The date this session treats as today.
    #[must_use]
    pub const fn today(&self) -> Date {
        self.today
    }

    /// Live tasks.
    #[must_use]
    pub const fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    /// Live goals.
    #[must_use]
    pub const fn goals(&self) -> &GoalStore {
        &self.goals
    }

    /// Undo buffer for `kind`, as a snapshot count.
    #[must_use]
    pub fn pending_undo(&self, kind: CacheKind) -> usize {
        match kind {
            CacheKind::DeletedTasks => self.deleted_tasks.len(),
            CacheKind::CompletedTasks => self.completed_tasks.len(),
            CacheKind::DeletedGoals => self.deleted_goals.len(),
            CacheKind::CompletedGoals => self.completed_goals.len(),
        }
    }

    // Task queries relative to today.

    /// Tasks due before today with their days late.
    pub fn overdue(&self) -> impl Iterator<Item = (&Task, i64)> {
        self.tasks.overdue(self.today)
    }

    /// Tasks due today.
    pub fn due_today(&self) -> impl Iterator<Item = &Task> {
        self.tasks.due_on(self.today)
    }

    /// Tasks due tomorrow.
    pub fn due_tomorrow(&self) -> impl Iterator<Item = &Task> {
        self.tasks.due_tomorrow(self.today)
    }

    /// Tasks due after tomorrow with their days remaining.
    pub fn future(&self) -> impl Iterator<Item = (&Task, i64)> {
        self.tasks.future(self.today)
    }

    // Task mutations.

    /// Add a task. It falls due today and does not repeat unless told
    /// otherwise. Returns its position.
    pub fn add_task(
        &mut self,
        description: impl Into<String>,
        due: Option<Date>,
        recurrence: Option<Recurrence>,
    ) -> usize {
        self.tasks.add(
            description,
            due.unwrap_or(self.today),
            recurrence.unwrap_or_default(),
        )
    }

    /// Add already-built tasks, e.g. from an import. Returns how many.
    pub fn import_tasks(&mut self, tasks: impl IntoIterator<Item = Task>) -> usize {
        let mut added = 0;
        for task in tasks {
            self.tasks.insert(task);
            added += 1;
        }
        added
    }

    /// Delete a task, keeping it in the deleted-tasks buffer.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn delete_task(&mut self, position: usize) -> Result<Task> {
        let removed = self.tasks.delete(position)?;
        self.deleted_tasks.push(removed.clone(), position - 1);
        Ok(removed)
    }

    /// Complete a task, keeping its prior state in the completed-tasks buffer.
    ///
    /// # Errors
    /// Returns `OutOfRange` for an invalid position and `ScheduleMismatch`
    /// when a weekday cycle does not fit the due date.
    pub fn complete_task(&mut self, position: usize) -> Result<Completion> {
        let outcome = self.tasks.complete(position)?;
        self.completed_tasks
            .push(outcome.snapshot().clone(), position - 1);
        Ok(outcome)
    }

    /// Complete every task due today, each exactly once.
    ///
    /// The set is fixed before the first completion, so recurring tasks that
    /// move around while the batch runs are neither skipped nor repeated.
    /// Failures are collected and the rest of the batch still runs.
    pub fn complete_all_due_today(&mut self) -> BatchOutcome {
        let keys = self.tasks.keys_due_on(self.today);
        let mut outcome = BatchOutcome::default();
        for key in keys {
            let Some(position) = self.tasks.position_of(key) else {
                continue;
            };
            match self.tasks.complete_by_key(key) {
                Some(Ok(done)) => {
                    self.completed_tasks
                        .push(done.snapshot().clone(), position - 1);
                    outcome.completed.push(done);
                }
                Some(Err(err)) => {
                    warn!(%key, %err, "Skipping task in batch completion");
                    if let Ok(task) = self.tasks.get(position) {
                        outcome.failed.push((task.clone(), err));
                    }
                }
                None => {}
            }
        }
        debug!(
            completed = outcome.completed.len(),
            failed = outcome.failed.len(),
            "Completed today's tasks"
        );
        outcome
    }

    /// Replace a task's description.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn edit_task(&mut self, position: usize, description: impl Into<String>) -> Result<()> {
        self.tasks.edit(position, description)
    }

    /// Move a task to another day. Returns its new position.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn reschedule_task(&mut self, position: usize, due: Date) -> Result<usize> {
        self.tasks.reschedule(position, due)
    }

    /// Attach a repeat rule.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn set_recurrence(&mut self, position: usize, rule: Recurrence) -> Result<()> {
        self.tasks.set_recurrence(position, rule)
    }

    /// Remove a repeat rule.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn clear_recurrence(&mut self, position: usize) -> Result<()> {
        self.tasks.clear_recurrence(position)
    }

    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn add_subtask(&mut self, position: usize, description: impl Into<String>) -> Result<()> {
        self.tasks.add_subtask(position, description)
    }

    /// # Errors
    /// Returns `OutOfRange` for an invalid task or subtask position.
    pub fn complete_subtask(&mut self, position: usize, subtask: usize) -> Result<()> {
        self.tasks.complete_subtask(position, subtask)
    }

    /// # Errors
    /// Returns `OutOfRange` for an invalid task or subtask position.
    pub fn uncomplete_subtask(&mut self, position: usize, subtask: usize) -> Result<()> {
        self.tasks.uncomplete_subtask(position, subtask)
    }

    /// # Errors
    /// Returns `OutOfRange` for an invalid task or subtask position.
    pub fn delete_subtask(&mut self, position: usize, subtask: usize) -> Result<()> {
        self.tasks.delete_subtask(position, subtask)
    }

    /// # Errors
    /// Returns `OutOfRange` for an invalid task or subtask position.
    pub fn edit_subtask(
        &mut self,
        position: usize,
        subtask: usize,
        description: impl Into<String>,
    ) -> Result<()> {
        self.tasks.edit_subtask(position, subtask, description)
    }

    /// Drop every task. Not undoable.
    pub fn clear_tasks(&mut self) -> usize {
        self.tasks.clear()
    }

    // Goal mutations.

    /// Add a goal at 0% unless a percentage is given. Returns its position.
    ///
    /// # Errors
    /// Returns `InvalidRange` when `percent` is outside 0..=100.
    pub fn add_goal(
        &mut self,
        description: impl Into<String>,
        target: Option<String>,
        percent: Option<i64>,
    ) -> Result<usize> {
        self.goals.add(description, target, percent.unwrap_or(0))
    }

    /// Delete a goal, keeping it in the deleted-goals buffer.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn delete_goal(&mut self, position: usize) -> Result<Goal> {
        let (goal, origin) = self.goals.delete(position)?;
        self.deleted_goals.push(goal.clone(), origin);
        Ok(goal)
    }

    /// Complete a goal, keeping it in the completed-goals buffer.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn complete_goal(&mut self, position: usize) -> Result<Goal> {
        let (goal, origin) = self.goals.complete(position)?;
        self.completed_goals.push(goal.clone(), origin);
        Ok(goal)
    }

    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn edit_goal(&mut self, position: usize, description: impl Into<String>) -> Result<()> {
        self.goals.edit(position, description)
    }

    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn set_goal_target(&mut self, position: usize, target: Option<String>) -> Result<()> {
        self.goals.set_target(position, target)
    }

    /// # Errors
    /// Returns `InvalidRange` outside 0..=100 and `OutOfRange` for an invalid
    /// position.
    pub fn set_goal_percent(&mut self, position: usize, percent: i64) -> Result<()> {
        self.goals.set_percent(position, percent)
    }

    /// Drop every goal. Not undoable.
    pub fn clear_goals(&mut self) -> usize {
        self.goals.clear()
    }

    // Undo.

    /// Bring back the most recently deleted task. Returns its position.
    ///
    /// # Errors
    /// Returns `EmptyCache` when nothing was deleted.
    pub fn undo_delete_task(&mut self) -> Result<usize> {
        self.deleted_tasks.restore(&mut self.tasks)
    }

    /// Revert the most recent task completion. Returns the task's position.
    ///
    /// # Errors
    /// Returns `EmptyCache` when nothing was completed.
    pub fn uncheck_task(&mut self) -> Result<usize> {
        let snapshot = self.completed_tasks.pop()?;
        let position = self.tasks.replace_or_insert(snapshot);
        debug!(position, "Reopened completed task");
        Ok(position)
    }

    /// Bring back the most recently deleted goal. Returns its position.
    ///
    /// # Errors
    /// Returns `EmptyCache` when nothing was deleted.
    pub fn undo_delete_goal(&mut self) -> Result<usize> {
        self.deleted_goals.restore(&mut self.goals)
    }

    /// Revert the most recent goal completion. Returns the goal's position.
    ///
    /// # Errors
    /// Returns `EmptyCache` when nothing was completed.
    pub fn uncheck_goal(&mut self) -> Result<usize> {
        self.completed_goals.restore(&mut self.goals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskian_core::{DEFAULT_UNDO_DEPTH, ItemKind};
    use time::Weekday;
    use time::macros::date;

    // A Wednesday.
    const TODAY: Date = date!(2024 - 01 - 10);

    fn session() -> Session {
        Session::new(TODAY, DEFAULT_UNDO_DEPTH)
    }

    #[test]
    fn add_task_defaults_to_today_without_repeat() -> anyhow::Result<()> {
        let mut session = session();
        let position = session.add_task("stretch", None, None);
        let task = session.tasks().get(position)?;
        assert_eq!(task.due, TODAY);
        assert_eq!(task.recurrence, Recurrence::None);
        Ok(())
    }

    #[test]
    fn delete_and_undo_restores_task() -> anyhow::Result<()> {
        let mut session = session();
        session.add_task("a", None, None);
        session.add_task("b", None, None);
        let before = session.tasks().clone();

        assert_eq!(session.delete_task(1)?.description, "a");
        assert_eq!(session.pending_undo(CacheKind::DeletedTasks), 1);
        assert_eq!(session.undo_delete_task()?, 1);
        assert_eq!(session.tasks(), &before);
        Ok(())
    }

    #[test]
    fn undo_on_empty_buffers_changes_nothing() {
        let mut session = session();
        session.add_task("a", None, None);
        let before = session.tasks().clone();
        for (result, kind) in [
            (session.undo_delete_task(), CacheKind::DeletedTasks),
            (session.uncheck_task(), CacheKind::CompletedTasks),
            (session.undo_delete_goal(), CacheKind::DeletedGoals),
            (session.uncheck_goal(), CacheKind::CompletedGoals),
        ] {
            assert_eq!(result, Err(CoreError::EmptyCache(kind)));
        }
        assert_eq!(session.tasks(), &before);
        assert!(session.goals().is_empty());
    }

    #[test]
    fn uncheck_recurring_task_leaves_single_copy() -> anyhow::Result<()> {
        let mut session = session();
        session.add_task("water plants", None, Some(Recurrence::every(3)?));
        session.complete_task(1)?;
        assert_eq!(session.tasks().get(1)?.due, date!(2024 - 01 - 13));

        session.uncheck_task()?;
        assert_eq!(session.tasks().len(), 1);
        assert_eq!(session.tasks().get(1)?.due, TODAY);
        Ok(())
    }

    #[test]
    fn undo_delete_after_uncheck_keeps_both_copies() -> anyhow::Result<()> {
        let mut session = session();
        session.add_task("water plants", None, Some(Recurrence::every(3)?));
        session.complete_task(1)?;
        session.delete_task(1)?;
        assert!(session.tasks().is_empty());

        session.uncheck_task()?;
        session.undo_delete_task()?;
        let dues: Vec<_> = session.tasks().tasks().iter().map(|task| task.due).collect();
        assert_eq!(dues, vec![TODAY, date!(2024 - 01 - 13)]);
        assert_ne!(session.tasks().get(1)?.key, session.tasks().get(2)?.key);
        Ok(())
    }

    #[test]
    fn batch_completes_each_task_due_today_once() -> anyhow::Result<()> {
        let mut session = session();
        session.add_task("daily", None, Some(Recurrence::every(1)?));
        session.add_task("one-off", None, None);
        session.add_task("weekly", None, Some(Recurrence::cycle(vec![Weekday::Wednesday])?));
        session.add_task("tomorrow", Some(date!(2024 - 01 - 11)), None);

        let outcome = session.complete_all_due_today();
        assert_eq!(outcome.completed.len(), 3);
        assert!(outcome.failed.is_empty());
        assert_eq!(session.due_today().count(), 0);

        let names: Vec<_> = session
            .tasks()
            .tasks()
            .iter()
            .map(|task| (task.description.as_str(), task.due))
            .collect();
        assert_eq!(names, vec![
            ("daily", date!(2024 - 01 - 11)),
            ("tomorrow", date!(2024 - 01 - 11)),
            ("weekly", date!(2024 - 01 - 17)),
        ]);
        assert_eq!(session.pending_undo(CacheKind::CompletedTasks), 3);
        Ok(())
    }

    #[test]
    fn batch_reports_failures_and_keeps_going() -> anyhow::Result<()> {
        let mut session = session();
        // Wednesday is not part of this cycle.
        let rule = Recurrence::cycle(vec![Weekday::Monday, Weekday::Friday])?;
        session.add_task("mismatched", None, Some(rule));
        session.add_task("fine", None, None);

        let outcome = session.complete_all_due_today();
        assert_eq!(outcome.completed.len(), 1);
        let [(task, err)] = outcome.failed.as_slice() else {
            panic!("exactly one failure expected");
        };
        assert_eq!(task.description, "mismatched");
        assert!(matches!(err, CoreError::ScheduleMismatch { .. }));
        assert_eq!(session.tasks().len(), 1);
        Ok(())
    }

    #[test]
    fn goal_lifecycle_with_undo() -> anyhow::Result<()> {
        let mut session = session();
        session.add_goal("a", None, None)?;
        session.add_goal("b", Some("June".into()), Some(40))?;
        session.add_goal("c", None, None)?;

        session.delete_goal(2)?;
        assert_eq!(session.undo_delete_goal()?, 2);
        assert_eq!(session.goals().get(2)?.description, "b");

        session.complete_goal(1)?;
        session.uncheck_goal()?;
        assert_eq!(session.goals().get(1)?.description, "a");

        assert!(session.add_goal("d", None, Some(101)).is_err());
        assert_eq!(session.goals().len(), 3);
        Ok(())
    }

    #[test]
    fn errors_carry_kind_and_position() {
        let mut session = session();
        assert_eq!(
            session.complete_goal(1),
            Err(CoreError::OutOfRange {
                kind: ItemKind::Goal,
                position: 1,
                len: 0,
            })
        );
        assert!(session.edit_subtask(1, 1, "x").is_err());
    }

    #[test]
    fn snapshot_round_trips_through_open() -> anyhow::Result<()> {
        let mut session = session();
        session.add_task("a", Some(date!(2024 - 01 - 09)), None);
        session.add_task("b", None, Some("mon,wed".parse()?));
        session.add_subtask(2, "prep")?;
        session.add_goal("g", None, Some(50))?;
        session.delete_task(1)?;
        session.complete_goal(1)?;

        let state = session.snapshot();
        let mut reopened = Session::open(state.clone(), TODAY, DEFAULT_UNDO_DEPTH);
        assert_eq!(reopened.snapshot(), state);
        assert_eq!(reopened.undo_delete_task()?, 1);
        assert_eq!(reopened.uncheck_goal()?, 1);
        Ok(())
    }

    #[test]
    fn open_applies_undo_depth() -> anyhow::Result<()> {
        let mut session = Session::new(TODAY, 2);
        for name in ["a", "b", "c"] {
            session.add_task(name, None, None);
        }
        for _ in 0..3 {
            session.delete_task(1)?;
        }
        assert_eq!(session.pending_undo(CacheKind::DeletedTasks), 2);

        let reopened = Session::open(session.snapshot(), TODAY, 1);
        assert_eq!(reopened.pending_undo(CacheKind::DeletedTasks), 1);
        Ok(())
    }

    #[test]
    fn clear_is_not_undoable() {
        let mut session = session();
        session.add_task("a", None, None);
        assert_eq!(session.clear_tasks(), 1);
        assert!(session.undo_delete_task().is_err());
    }
}
