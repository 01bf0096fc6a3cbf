use anyhow::Error;
use taskian_store::{JsonStore, SessionState, StoreError};

/// Abstraction over where session state is kept between runs.
pub trait StateStore {
    /// Error type bubbled up from the backing store.
    type Error: Into<Error>;

    /// Read the persisted state; an absent store yields an empty state.
    ///
    /// # Errors
    /// Returns a store-specific error when the state cannot be read.
    fn load_state(&self) -> Result<SessionState, Self::Error>;

    /// Replace the persisted state.
    ///
    /// # Errors
    /// Returns a store-specific error when the state cannot be written.
    fn save_state(&self, state: &SessionState) -> Result<(), Self::Error>;
}

impl StateStore for JsonStore {
    type Error = StoreError;

    fn load_state(&self) -> Result<SessionState, Self::Error> {
        Self::load(self)
    }

    fn save_state(&self, state: &SessionState) -> Result<(), Self::Error> {
        Self::save(self, state)
    }
}
