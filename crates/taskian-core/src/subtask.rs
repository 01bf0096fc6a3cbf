//! Checklist items owned by a single task.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ItemKind, Result, index_for};

/// A single checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// Plain description without any completion marker.
    pub description: String,
    /// Whether the entry has been checked off.
    #[serde(default)]
    pub done: bool,
}

impl Subtask {
    /// Create an open subtask.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            done: false,
        }
    }
}

/// Ordered checklist. Positions are 1-based at the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubtaskList {
    items: Vec<Subtask>,
}

impl SubtaskList {
    /// Build a list from existing entries.
    #[must_use]
    pub const fn from_items(items: Vec<Subtask>) -> Self {
        Self { items }
    }

    /// Entries in checklist order.
    #[must_use]
    pub fn items(&self) -> &[Subtask] {
        &self.items
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the checklist has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> std::slice::Iter<'_, Subtask> {
        self.items.iter()
    }

    /// Append a new open entry.
    pub fn add(&mut self, description: impl Into<String>) {
        self.items.push(Subtask::new(description));
    }

    /// Remove the entry at `position`.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current entry.
    pub fn delete(&mut self, position: usize) -> Result<Subtask> {
        let idx = self.index(position)?;
        Ok(self.items.remove(idx))
    }

    /// Mark the entry at `position` as done.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current entry.
    pub fn complete(&mut self, position: usize) -> Result<()> {
        self.entry_mut(position)?.done = true;
        Ok(())
    }

    /// Clear the done mark of the entry at `position`.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current entry.
    pub fn uncomplete(&mut self, position: usize) -> Result<()> {
        self.entry_mut(position)?.done = false;
        Ok(())
    }

    /// Replace the description of the entry at `position`, keeping its state.
    ///
    /// # Errors
    /// Returns `OutOfRange` when `position` is not a current entry.
    pub fn edit(&mut self, position: usize, description: impl Into<String>) -> Result<()> {
        self.entry_mut(position)?.description = description.into();
        Ok(())
    }

    /// Reopen every entry. Used when a recurring task rolls to a new cycle.
    pub fn reset_all(&mut self) {
        let reopened = self.items.iter().filter(|item| item.done).count();
        for item in &mut self.items {
            item.done = false;
        }
        if reopened > 0 {
            debug!(reopened, "Reset subtasks for new cycle");
        }
    }

    fn index(&self, position: usize) -> Result<usize> {
        index_for(ItemKind::Subtask, position, self.items.len())
    }

    fn entry_mut(&mut self, position: usize) -> Result<&mut Subtask> {
        let idx = self.index(position)?;
        Ok(&mut self.items[idx])
    }
}

impl<'a> IntoIterator for &'a SubtaskList {
    type Item = &'a Subtask;
    type IntoIter = std::slice::Iter<'a, Subtask>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
