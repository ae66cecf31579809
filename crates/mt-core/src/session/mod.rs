//! Timers and recorded sessions.
//!
//! [`SessionService`] implements the three session-facing contracts:
//! - [`ActiveTimer`]: the single running timer
//! - [`SessionLifecycle`]: recording, invoicing and closing sessions
//! - [`SessionQuery`]: staged filtering joined against the catalog
//!
//! The service holds no state of its own. The store and the catalog are
//! handed in at construction and shared with whoever else the caller wires
//! them into.

mod filter;
mod lifecycle;
mod timer;

use chrono::{DateTime, Utc};

use crate::catalog::CatalogLookup;
use crate::error::Result;
use crate::records::Session;
use crate::store::DocumentStore;

pub use filter::SessionQuery;
pub use lifecycle::SessionLifecycle;
pub use timer::ActiveTimer;

/// Session operations over a document store and a catalog.
pub struct SessionService<'a, S, C> {
    store: &'a S,
    catalog: &'a C,
}

impl<'a, S: DocumentStore, C: CatalogLookup> SessionService<'a, S, C> {
    pub const fn new(store: &'a S, catalog: &'a C) -> Self {
        Self { store, catalog }
    }

    /// Converts the running timer into a recorded session ending at `end`.
    ///
    /// The session is written before the timer rows are removed.
    pub fn stop_active_session(&self, end: DateTime<Utc>) -> Result<Session> {
        let mut active = self.get_active_session()?;
        active.end_time = Some(end);

        let mut session = Session::recorded_from(&active, end);
        session.session_id = self.create_session(session.clone())?;
        self.delete_active_sessions()?;

        tracing::info!(
            session_id = session.session_id,
            active_session_id = %active.active_session_id,
            "recorded session"
        );
        Ok(session)
    }
}
