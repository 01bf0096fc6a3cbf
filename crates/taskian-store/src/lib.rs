//! File-backed storage for taskian sessions.

pub mod error;
pub mod lines;

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use taskian_core::{Goal, Snapshot, Task};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub use error::{Result, StoreError};

/// Current on-disk format version.
pub const STATE_VERSION: u32 = 1;

/// Everything persisted between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Tasks in display order.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Goals in display order.
    #[serde(default)]
    pub goals: Vec<Goal>,
    /// Buffered undo snapshots.
    #[serde(default)]
    pub undo: UndoState,
}

/// Persisted undo buffers, oldest snapshot first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoState {
    /// Deleted tasks.
    #[serde(default)]
    pub deleted_tasks: Vec<Snapshot<Task>>,
    /// Completed tasks.
    #[serde(default)]
    pub completed_tasks: Vec<Snapshot<Task>>,
    /// Deleted goals.
    #[serde(default)]
    pub deleted_goals: Vec<Snapshot<Goal>>,
    /// Completed goals.
    #[serde(default)]
    pub completed_goals: Vec<Snapshot<Goal>>,
}

const fn default_version() -> u32 {
    STATE_VERSION
}

/// Session state stored as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Store backed by `path`. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the session state. A missing file yields an empty state.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, is not valid JSON, or
    /// carries a newer format version.
    pub fn load(&self) -> Result<SessionState> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No data file yet, starting empty");
                return Ok(SessionState::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let state: SessionState =
            serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        if state.version > STATE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: state.version,
                supported: STATE_VERSION,
            });
        }
        debug!(
            tasks = state.tasks.len(),
            goals = state.goals.len(),
            "Loaded session"
        );
        Ok(state)
    }

    /// Write the session state atomically (temp file + rename).
    ///
    /// # Errors
    /// Returns an error when the parent directory cannot be created or the
    /// file cannot be written.
    pub fn save(&self, state: &SessionState) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|source| self.io_error(source))?;

        let body = serde_json::to_string_pretty(state)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|source| self.io_error(source))?;
        tmp.write_all(body.as_bytes())
            .and_then(|()| tmp.write_all(b"\n"))
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|source| self.io_error(source))?;
        tmp.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;

        info!(
            path = %self.path.display(),
            tasks = state.tasks.len(),
            goals = state.goals.len(),
            "Saved session"
        );
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
