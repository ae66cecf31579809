//! Core domain logic for mytime.
//!
//! This crate contains the records and services for:
//! - Catalog: clients, billing categories and projects
//! - Timer: the single active session
//! - Sessions: recording, invoicing, closing and searching billed work
//!
//! Everything is generic over a [`DocumentStore`]; the crate itself performs
//! no I/O.

pub mod catalog;
pub mod codes;
mod error;
pub mod records;
pub mod session;
mod store;

#[cfg(test)]
mod testing;

pub use catalog::{CatalogLookup, CatalogService};
pub use error::{Conflict, Error, InvoiceFailure, Result, StoreFailure};
pub use records::{
    ActiveSession, Category, CategorySearch, Client, ClientSearch, Project, ProjectSearch,
    Session, SessionSearch, SessionState,
};
pub use session::{ActiveTimer, SessionLifecycle, SessionQuery, SessionService};
pub use store::{Document, DocumentStore, Op, Predicate, Query, Value};
