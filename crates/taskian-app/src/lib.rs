//! Application layer for taskian.
//!
//! This crate holds the session context shared by the one-shot CLI commands
//! and the interactive shell, along with configuration and persistence glue.

pub mod config;
pub mod service;
pub mod session;
pub mod state_store;

// Re-exports for convenience
pub use config::{AppConfig, DisplayConfig};
pub use service::SessionService;
pub use session::{BatchOutcome, Session, local_today};
pub use state_store::StateStore;
