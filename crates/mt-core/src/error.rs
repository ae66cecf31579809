//! Error taxonomy shared by every service in the core.

use std::fmt;

use thiserror::Error;

/// Boxed source error coming out of a [`DocumentStore`](crate::DocumentStore).
pub type StoreFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A required single-row lookup matched nothing.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    /// A business rule rejected the operation.
    #[error(transparent)]
    Conflict(#[from] Conflict),
    /// The store failed while reading or writing a record.
    #[error("{context}")]
    Persistence {
        context: String,
        #[source]
        source: StoreFailure,
    },
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub(crate) fn persistence<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Persistence {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Returns true for [`Error::NotFound`].
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the conflict kind, if this is a business-rule rejection.
    pub const fn conflict(&self) -> Option<Conflict> {
        match self {
            Self::Conflict(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Business-rule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("a session is already active")]
    SessionActive,
    #[error("session already invoiced")]
    AlreadyInvoiced,
    #[error("cannot invoice a paid session")]
    InvoicePaid,
    #[error("session already closed")]
    AlreadyClosed,
}

/// One failed item of a batch invoice.
#[derive(Debug, Error)]
#[error("session {session_id}: {source}")]
pub struct InvoiceFailure {
    pub session_id: i64,
    #[source]
    pub source: Error,
}

/// Result alias for core operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
