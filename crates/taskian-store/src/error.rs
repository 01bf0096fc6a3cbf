//! Error types for taskian persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing session data.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The data file is not valid session JSON.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to serialize session state.
    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The data file was written by a newer format version.
    #[error("Unsupported data version {found} (this build reads up to {supported})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Highest version this build understands.
        supported: u32,
    },

    /// A delimited task line could not be decoded.
    #[error("Line {line}: {reason}")]
    MalformedLine {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A task cannot be written in the delimited format without changing
    /// how it reads back.
    #[error("'{0}' cannot be exported: it contains '|' or ';', starts with '#', or ends in '[Done]'")]
    Unencodable(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
