use anyhow::{Context, Error, Result};
use time::Date;
use tracing::debug;

use crate::config::AppConfig;
use crate::session::Session;
use crate::state_store::StateStore;

/// Service façade pairing a [`Session`] with the store it is loaded from and
/// flushed to.
pub struct SessionService<S> {
    store: S,
    session: Session,
}

impl<S: StateStore> SessionService<S> {
    /// Load persisted state from `store` and open a session pinned to `today`.
    ///
    /// # Errors
    /// Returns an error when the store cannot be read.
    pub fn open(store: S, today: Date, config: &AppConfig) -> Result<Self> {
        let state = store
            .load_state()
            .map_err(Into::<Error>::into)
            .context("Failed to load session data")?;
        let session = Session::with_config(state, today, config);
        debug!(%today, tasks = session.tasks().len(), goals = session.goals().len(), "Opened session");
        Ok(Self { store, session })
    }

    /// Write the current session back to the store.
    ///
    /// # Errors
    /// Returns an error when the store cannot be written.
    pub fn save(&self) -> Result<()> {
        self.store
            .save_state(&self.session.snapshot())
            .map_err(Into::<Error>::into)
            .context("Failed to save session data")
    }
}

impl<S> SessionService<S> {
    /// The live session.
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// The live session, for mutation.
    pub const fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// The backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io;
    use taskian_store::SessionState;
    use time::macros::date;

    const TODAY: Date = date!(2024 - 03 - 04);

    #[derive(Default)]
    struct MockStore {
        state: RefCell<SessionState>,
        saves: RefCell<usize>,
        fail_saves: bool,
    }

    impl StateStore for MockStore {
        type Error = io::Error;

        fn load_state(&self) -> Result<SessionState, Self::Error> {
            Ok(self.state.borrow().clone())
        }

        fn save_state(&self, state: &SessionState) -> Result<(), Self::Error> {
            if self.fail_saves {
                return Err(io::Error::other("disk full"));
            }
            *self.state.borrow_mut() = state.clone();
            *self.saves.borrow_mut() += 1;
            Ok(())
        }
    }

    #[test]
    fn open_mutate_save_reaches_store() -> Result<()> {
        let mut service = SessionService::open(MockStore::default(), TODAY, &AppConfig::default())?;
        service.session_mut().add_task("pay rent", None, None);
        service.session_mut().add_goal("learn rust", None, Some(10))?;
        service.save()?;

        let stored = service.store().state.borrow().clone();
        assert_eq!(*service.store().saves.borrow(), 1);
        assert_eq!(stored.tasks.len(), 1);
        assert_eq!(stored.tasks[0].due, TODAY);
        assert_eq!(stored.goals[0].percent, 10);
        Ok(())
    }

    #[test]
    fn undo_survives_a_reopen() -> Result<()> {
        let mut first = SessionService::open(MockStore::default(), TODAY, &AppConfig::default())?;
        first.session_mut().add_task("a", None, None);
        first.session_mut().delete_task(1)?;
        first.save()?;

        let store = MockStore {
            state: RefCell::new(first.store().state.borrow().clone()),
            ..MockStore::default()
        };
        let mut second = SessionService::open(store, TODAY, &AppConfig::default())?;
        assert!(second.session().tasks().is_empty());
        assert_eq!(second.session_mut().undo_delete_task()?, 1);
        Ok(())
    }

    #[test]
    fn save_failure_has_context() -> Result<()> {
        let store = MockStore {
            fail_saves: true,
            ..MockStore::default()
        };
        let service = SessionService::open(store, TODAY, &AppConfig::default())?;
        let Err(err) = service.save() else {
            panic!("save should fail");
        };
        assert_eq!(err.to_string(), "Failed to save session data");
        assert!(format!("{err:#}").contains("disk full"));
        Ok(())
    }
}
