//! Stored record types and search criteria.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Document;

/// A billed party. Projects and sessions reference clients by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub archived: bool,
}

impl Document for Client {
    const COLLECTION: &'static str = "clients";
    const ENTITY: &'static str = "client";
    const ID_FIELD: &'static str = "id";

    fn key(&self) -> String {
        self.id.to_string()
    }
}

/// A billing category with an hourly rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub rate: f64,
    pub archived: bool,
}

impl Document for Category {
    const COLLECTION: &'static str = "categories";
    const ENTITY: &'static str = "category";
    const ID_FIELD: &'static str = "id";

    fn key(&self) -> String {
        self.id.to_string()
    }
}

/// Work done for a client, timed against a default category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub client_id: i64,
    pub default_category_id: i64,
    pub archived: bool,
}

impl Document for Project {
    const COLLECTION: &'static str = "projects";
    const ENTITY: &'static str = "project";
    const ID_FIELD: &'static str = "id";

    fn key(&self) -> String {
        self.id.to_string()
    }
}

/// The currently running timer.
///
/// At most one exists at a time. It is deleted once converted to a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub active_session_id: String,
    pub project_id: i64,
    pub category_id: i64,
    pub client_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: String,
}

impl ActiveSession {
    /// Time elapsed since the timer started, as of `now`.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now - self.start_time
    }
}

impl Document for ActiveSession {
    const COLLECTION: &'static str = "active_sessions";
    const ENTITY: &'static str = "active session";
    const ID_FIELD: &'static str = "active_session_id";

    fn key(&self) -> String {
        self.active_session_id.clone()
    }
}

/// A recorded work interval with its billing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: i64,
    pub client_id: i64,
    pub project_id: i64,
    pub category_id: i64,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub notes: String,
    pub invoiced: bool,
    pub invoice_date: Option<DateTime<Utc>>,
    pub paid: bool,
    pub paid_date: Option<DateTime<Utc>>,
}

impl Session {
    /// Builds a fresh, unbilled session from a stopped timer.
    pub fn recorded_from(active: &ActiveSession, end: DateTime<Utc>) -> Self {
        Self {
            session_id: 0,
            client_id: active.client_id,
            project_id: active.project_id,
            category_id: active.category_id,
            start_date_time: active.start_time,
            end_date_time: end,
            notes: active.notes.clone(),
            invoiced: false,
            invoice_date: None,
            paid: false,
            paid_date: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end_date_time - self.start_date_time
    }

    /// Billing state derived from the invoiced/paid flags.
    pub const fn state(&self) -> SessionState {
        match (self.invoiced, self.paid) {
            (false, false) => SessionState::Recorded,
            (true, false) => SessionState::Invoiced,
            (true, true) => SessionState::Closed,
            (false, true) => SessionState::Paid,
        }
    }
}

impl Document for Session {
    const COLLECTION: &'static str = "sessions";
    const ENTITY: &'static str = "session";
    const ID_FIELD: &'static str = "session_id";

    fn key(&self) -> String {
        self.session_id.to_string()
    }
}

/// Billing state of a recorded session.
///
/// `Paid` without `Invoiced` only arises from data written outside the
/// lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Recorded,
    Invoiced,
    Paid,
    Closed,
}

impl SessionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recorded => "recorded",
            Self::Invoiced => "invoiced",
            Self::Paid => "paid",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Criteria for [`SessionQuery::list_sessions`](crate::SessionQuery::list_sessions).
///
/// `paid` and `invoiced` have no "any" state: the default search selects
/// sessions that are neither paid nor invoiced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSearch {
    pub paid: bool,
    pub invoiced: bool,
    pub category_code: String,
    pub client_code: String,
    pub project_code: String,
    pub session_id: i64,
    pub session_ids: Vec<i64>,
}

/// Criteria for listing clients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSearch {
    pub archived: bool,
    pub name: String,
}

/// Criteria for listing categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySearch {
    pub archived: bool,
    pub name: String,
}

/// Criteria for listing projects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSearch {
    pub archived: bool,
    pub name: String,
    /// Matched against the owning client's name or code.
    pub client: String,
}
