//! Manually ordered goal store.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, ItemKind, Result, index_for};
use crate::id::RecordKey;
use crate::undo::{Restore, Snapshot};

/// Number of segments in a goal's progress bar.
pub const PROGRESS_SEGMENTS: u8 = 20;

/// A long-running goal with a progress percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Stable identity.
    #[serde(default = "RecordKey::new")]
    pub key: RecordKey,
    /// 1-based display position.
    #[serde(default)]
    pub id: usize,
    /// Free-form description.
    pub description: String,
    /// Free-form target, e.g. a date or a milestone name.
    #[serde(default)]
    pub target: Option<String>,
    /// Progress in percent, 0 through 100.
    #[serde(default)]
    pub percent: u8,
}

impl Goal {
    /// Filled and empty segment counts for the progress bar.
    #[must_use]
    pub const fn progress_segments(&self) -> (u8, u8) {
        let filled = if self.percent >= 100 {
            PROGRESS_SEGMENTS
        } else {
            self.percent / 5
        };
        (filled, PROGRESS_SEGMENTS - filled)
    }
}

/// Goals in insertion order. Only deletion and restoration move them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalStore {
    goals: Vec<Goal>,
}

impl GoalStore {
    /// Build a store from loaded records, recomputing ids.
    #[must_use]
    pub fn from_goals(goals: Vec<Goal>) -> Self {
        let mut store = Self { goals };
        store.renumber();
        store
    }

    /// Goals in display order.
    #[must_use]
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    /// Number of goals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.goals.len()
    }

    /// True when there are no goals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// Goal at a 1-based position.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn get(&self, position: usize) -> Result<&Goal> {
        let idx = self.index(position)?;
        Ok(&self.goals[idx])
    }

    /// Append a goal and return its position.
    ///
    /// # Errors
    /// Returns `InvalidRange` when `percent` exceeds 100.
    pub fn add(
        &mut self,
        description: impl Into<String>,
        target: Option<String>,
        percent: i64,
    ) -> Result<usize> {
        let percent = validate_percent(percent)?;
        let goal = Goal {
            key: RecordKey::new(),
            id: 0,
            description: description.into(),
            target,
            percent,
        };
        debug!(key = %goal.key, "Adding goal");
        self.goals.push(goal);
        self.renumber();
        Ok(self.goals.len())
    }

    /// Remove the goal at `position`, returning it with its 0-based origin.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn delete(&mut self, position: usize) -> Result<(Goal, usize)> {
        let idx = self.index(position)?;
        let removed = self.goals.remove(idx);
        self.renumber();
        debug!(key = %removed.key, position, "Removed goal");
        Ok((removed, idx))
    }

    /// Complete the goal at `position`. Completed goals leave the list.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn complete(&mut self, position: usize) -> Result<(Goal, usize)> {
        self.delete(position)
    }

    /// Replace the description of the goal at `position`.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn edit(&mut self, position: usize, description: impl Into<String>) -> Result<()> {
        self.goal_mut(position)?.description = description.into();
        Ok(())
    }

    /// Set or clear the target of the goal at `position`.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current id.
    pub fn set_target(&mut self, position: usize, target: Option<String>) -> Result<()> {
        self.goal_mut(position)?.target = target.filter(|text| !text.trim().is_empty());
        Ok(())
    }

    /// Set the progress of the goal at `position`.
    ///
    /// # Errors
    /// Returns `InvalidRange` outside 0..=100 and `OutOfRange` for an invalid
    /// position. Nothing changes on error.
    pub fn set_percent(&mut self, position: usize, value: i64) -> Result<()> {
        let percent = validate_percent(value)?;
        self.goal_mut(position)?.percent = percent;
        Ok(())
    }

    /// Drop every goal and return how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.goals.len();
        self.goals.clear();
        removed
    }

    fn index(&self, position: usize) -> Result<usize> {
        index_for(ItemKind::Goal, position, self.goals.len())
    }

    fn goal_mut(&mut self, position: usize) -> Result<&mut Goal> {
        let idx = self.index(position)?;
        Ok(&mut self.goals[idx])
    }

    fn renumber(&mut self) {
        for (idx, goal) in self.goals.iter_mut().enumerate() {
            goal.id = idx + 1;
        }
    }
}

impl Restore<Goal> for GoalStore {
    /// Goals go back to where they were, or to the end when the list has
    /// since shrunk below that position.
    fn restore(&mut self, snapshot: Snapshot<Goal>) -> usize {
        let idx = snapshot.origin.min(self.goals.len());
        self.goals.insert(idx, snapshot.record);
        self.renumber();
        idx + 1
    }
}

fn validate_percent(value: i64) -> Result<u8> {
    u8::try_from(value)
        .ok()
        .filter(|percent| *percent <= 100)
        .ok_or(CoreError::InvalidRange {
            field: "percent",
            value,
        })
}
