//! Last-in-first-out buffers of removed or completed records.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CacheKind, CoreError, Result};

/// Default number of snapshots retained per cache.
pub const DEFAULT_UNDO_DEPTH: usize = 20;

/// Full copy of a record taken when it left the live list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    /// The record as it was before the action.
    pub record: T,
    /// 0-based position the record occupied in the live list.
    pub origin: usize,
}

/// A live store that can take a snapshot back.
pub trait Restore<T> {
    /// Re-insert `snapshot` through the store's ordering path and return the
    /// record's new 1-based position.
    fn restore(&mut self, snapshot: Snapshot<T>) -> usize;
}

/// Bounded LIFO buffer for one entity x action pair.
#[derive(Debug, Clone)]
pub struct UndoCache<T> {
    kind: CacheKind,
    depth: usize,
    entries: Vec<Snapshot<T>>,
}

impl<T> UndoCache<T> {
    /// Empty cache with the default depth.
    #[must_use]
    pub const fn new(kind: CacheKind) -> Self {
        Self::with_depth(kind, DEFAULT_UNDO_DEPTH)
    }

    /// Empty cache retaining at most `depth` snapshots (at least one).
    #[must_use]
    pub const fn with_depth(kind: CacheKind, depth: usize) -> Self {
        Self {
            kind,
            depth: if depth == 0 { 1 } else { depth },
            entries: Vec::new(),
        }
    }

    /// Rebuild a cache from persisted snapshots, oldest first.
    #[must_use]
    pub fn from_entries(kind: CacheKind, depth: usize, entries: Vec<Snapshot<T>>) -> Self {
        let mut cache = Self::with_depth(kind, depth);
        cache.entries = entries;
        cache.trim();
        cache
    }

    /// Which buffer this is.
    #[must_use]
    pub const fn kind(&self) -> CacheKind {
        self.kind
    }

    /// Number of buffered snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing can be restored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent snapshot, if any.
    #[must_use]
    pub fn peek(&self) -> Option<&Snapshot<T>> {
        self.entries.last()
    }

    /// Buffered snapshots, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[Snapshot<T>] {
        &self.entries
    }

    /// Buffer a snapshot, dropping the oldest one beyond the configured depth.
    pub fn push(&mut self, record: T, origin: usize) {
        self.entries.push(Snapshot { record, origin });
        self.trim();
    }

    /// Remove and return the most recent snapshot.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyCache`] when nothing is buffered.
    pub fn pop(&mut self) -> Result<Snapshot<T>> {
        self.entries.pop().ok_or(CoreError::EmptyCache(self.kind))
    }

    /// Pop the most recent snapshot and hand it back to `store`.
    ///
    /// Returns the restored record's 1-based position.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyCache`] when nothing is buffered; `store` is
    /// not touched in that case.
    pub fn restore<S>(&mut self, store: &mut S) -> Result<usize>
    where
        S: Restore<T>,
    {
        let snapshot = self.pop()?;
        let position = store.restore(snapshot);
        debug!(cache = %self.kind, position, remaining = self.entries.len(), "Restored snapshot");
        Ok(position)
    }

    fn trim(&mut self) {
        if self.entries.len() > self.depth {
            let overflow = self.entries.len() - self.depth;
            self.entries.drain(..overflow);
        }
    }
}
