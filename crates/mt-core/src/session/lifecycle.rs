//! Recording and billing transitions for sessions.
//!
//! ```text
//! Active ──stop──▶ Recorded ──invoice──▶ Invoiced ──▶ Paid
//!                     │                                 ▲
//!                     └─────────────close───────────────┘
//! ```

use chrono::Utc;

use crate::catalog::CatalogLookup;
use crate::error::{Conflict, Error, InvoiceFailure, Result};
use crate::records::Session;
use crate::store::DocumentStore;

use super::SessionService;

pub trait SessionLifecycle {
    /// Inserts `session` under the next free id and returns that id.
    fn create_session(&self, session: Session) -> Result<i64>;

    fn get_session_by_id(&self, session_id: i64) -> Result<Session>;

    /// Marks a session invoiced now.
    ///
    /// Rejects sessions that are already invoiced, and sessions that are
    /// already paid whatever their invoiced flag.
    fn invoice_session(&self, session_id: i64) -> Result<()>;

    /// Invoices each id independently, in order. A failure does not stop the
    /// remaining ids and nothing is rolled back.
    fn invoice_sessions(&self, session_ids: &[i64]) -> Vec<Result<(), InvoiceFailure>>;

    /// Marks a session invoiced and paid in one write, both dated now.
    fn close_session(&self, session_id: i64) -> Result<()>;

    /// Persists `session` as is, without any transition checks.
    fn update_session(&self, session: &Session) -> Result<()>;
}

impl<S: DocumentStore, C: CatalogLookup> SessionLifecycle for SessionService<'_, S, C> {
    fn create_session(&self, mut session: Session) -> Result<i64> {
        session.session_id = self
            .store
            .next_numeric_id::<Session>()
            .map_err(|e| Error::persistence("failed to allocate session id", e))?;
        self.store.insert(&session).map_err(|e| {
            Error::persistence(format!("failed to insert session {}", session.session_id), e)
        })?;
        Ok(session.session_id)
    }

    fn get_session_by_id(&self, session_id: i64) -> Result<Session> {
        self.store.query().eq("session_id", session_id).first()
    }

    fn invoice_session(&self, session_id: i64) -> Result<()> {
        let mut session = self.get_session_by_id(session_id)?;
        if session.invoiced {
            return Err(Conflict::AlreadyInvoiced.into());
        }
        if session.paid {
            return Err(Conflict::InvoicePaid.into());
        }

        session.invoiced = true;
        session.invoice_date = Some(Utc::now());
        self.update_session(&session)?;
        tracing::debug!(session_id, "invoiced session");
        Ok(())
    }

    fn invoice_sessions(&self, session_ids: &[i64]) -> Vec<Result<(), InvoiceFailure>> {
        session_ids
            .iter()
            .map(|&session_id| {
                self.invoice_session(session_id)
                    .map_err(|source| InvoiceFailure { session_id, source })
            })
            .collect()
    }

    fn close_session(&self, session_id: i64) -> Result<()> {
        let mut session = self.get_session_by_id(session_id)?;
        if session.invoiced && session.paid {
            return Err(Conflict::AlreadyClosed.into());
        }

        let now = Utc::now();
        session.invoiced = true;
        session.invoice_date = Some(now);
        session.paid = true;
        session.paid_date = Some(now);
        self.update_session(&session)?;
        tracing::debug!(session_id, "closed session");
        Ok(())
    }

    fn update_session(&self, session: &Session) -> Result<()> {
        self.store.update(session).map_err(|e| {
            Error::persistence(format!("failed to update session {}", session.session_id), e)
        })
    }
}
