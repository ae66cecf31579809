//! The single active timer.

use chrono::{DateTime, Utc};

use crate::catalog::CatalogLookup;
use crate::codes::generate_id;
use crate::error::{Conflict, Error, Result};
use crate::records::ActiveSession;
use crate::store::DocumentStore;

use super::SessionService;

/// Creates, reads and removes the running timer.
///
/// At most one [`ActiveSession`] may exist. `start_active_session` does not
/// enforce this itself: callers check [`ActiveTimer::ensure_no_active_session`]
/// first. The check and the insert are not atomic, which is fine for a
/// single-user, single-process tool.
pub trait ActiveTimer {
    fn has_active_session(&self) -> Result<bool>;

    /// Returns the running timer, or [`Error::NotFound`] when there is none.
    fn get_active_session(&self) -> Result<ActiveSession>;

    /// Persists a new timer starting now and returns it with its start time.
    fn start_active_session(
        &self,
        project_id: i64,
        category_id: i64,
        client_id: i64,
        notes: &str,
    ) -> Result<(ActiveSession, DateTime<Utc>)>;

    /// Removes every timer row. Succeeds when there are none.
    fn delete_active_sessions(&self) -> Result<()>;

    /// Fails with [`Conflict::SessionActive`] while a timer is running.
    fn ensure_no_active_session(&self) -> Result<()> {
        if self.has_active_session()? {
            return Err(Conflict::SessionActive.into());
        }
        Ok(())
    }
}

impl<S: DocumentStore, C: CatalogLookup> ActiveTimer for SessionService<'_, S, C> {
    fn has_active_session(&self) -> Result<bool> {
        let active = self.store.query::<ActiveSession>().all()?;
        Ok(!active.is_empty())
    }

    fn get_active_session(&self) -> Result<ActiveSession> {
        self.store.query::<ActiveSession>().first()
    }

    fn start_active_session(
        &self,
        project_id: i64,
        category_id: i64,
        client_id: i64,
        notes: &str,
    ) -> Result<(ActiveSession, DateTime<Utc>)> {
        let start_time = Utc::now();
        let active = ActiveSession {
            active_session_id: generate_id(),
            project_id,
            category_id,
            client_id,
            start_time,
            end_time: None,
            notes: notes.to_string(),
        };

        self.store.insert(&active).map_err(|e| {
            Error::persistence(
                format!("failed to insert active session {}", active.active_session_id),
                e,
            )
        })?;
        tracing::debug!(id = %active.active_session_id, project_id, "started timer");
        Ok((active, start_time))
    }

    fn delete_active_sessions(&self) -> Result<()> {
        for active in self.store.query::<ActiveSession>().all()? {
            self.store.delete(&active).map_err(|e| {
                Error::persistence(
                    format!("failed to delete active session {}", active.active_session_id),
                    e,
                )
            })?;
            tracing::debug!(id = %active.active_session_id, "deleted timer");
        }
        Ok(())
    }
}
