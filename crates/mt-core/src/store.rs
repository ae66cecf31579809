//! Document store contract.
//!
//! The core never talks to a database directly. Every service is generic over
//! a [`DocumentStore`]: a set of per-record-type collections supporting
//! insert, update, delete, predicate queries and numeric id allocation.
//!
//! Queries are built with [`Query`], which wraps the raw
//! [`DocumentStore::find`] call and maps store failures into
//! [`Error::Persistence`] and empty single-row results into
//! [`Error::NotFound`].

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// A record type stored in its own collection.
pub trait Document: Serialize + DeserializeOwned {
    /// Collection (table) name.
    const COLLECTION: &'static str;
    /// Human-readable entity name used in errors.
    const ENTITY: &'static str;
    /// Field holding the record's identity.
    const ID_FIELD: &'static str;

    /// The record's identity, rendered as a string key.
    fn key(&self) -> String;
}

/// Predicate operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Exact equality.
    Eq,
    /// Case-sensitive substring match on text fields.
    Contains,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "=",
            Self::Contains => " contains ",
        })
    }
}

/// Predicate operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A single `(field, op, value)` query condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: &'static str,
    pub op: Op,
    pub value: Value,
}

impl Predicate {
    pub fn new(field: &'static str, op: Op, value: impl Into<Value>) -> Self {
        Self {
            field,
            op,
            value: value.into(),
        }
    }

    /// Evaluates the predicate against a JSON-encoded document.
    ///
    /// Missing fields and type mismatches never match.
    pub fn matches(&self, document: &serde_json::Value) -> bool {
        let Some(field) = document.get(self.field) else {
            return false;
        };
        match (self.op, &self.value) {
            (Op::Eq, Value::Bool(expected)) => field.as_bool() == Some(*expected),
            (Op::Eq, Value::Int(expected)) => field.as_i64() == Some(*expected),
            (Op::Eq, Value::Text(expected)) => field.as_str() == Some(expected.as_str()),
            (Op::Contains, Value::Text(needle)) => {
                field.as_str().is_some_and(|s| s.contains(needle.as_str()))
            }
            (Op::Contains, _) => false,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, self.op, self.value)
    }
}

/// Storage backend required by the core.
///
/// `update` and `delete` match on [`Document::key`]. Implementations return
/// rows in insertion order.
pub trait DocumentStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Next free numeric id in `T`'s collection: max existing id + 1, or 1 when empty.
    fn next_numeric_id<T: Document>(&self) -> Result<i64, Self::Error>;

    fn insert<T: Document>(&self, record: &T) -> Result<(), Self::Error>;

    fn update<T: Document>(&self, record: &T) -> Result<(), Self::Error>;

    fn delete<T: Document>(&self, record: &T) -> Result<(), Self::Error>;

    /// Returns every record of `T` matching all predicates.
    fn find<T: Document>(&self, predicates: &[Predicate]) -> Result<Vec<T>, Self::Error>;

    /// Starts a query builder over `T`'s collection.
    fn query<T: Document>(&self) -> Query<'_, Self, T>
    where
        Self: Sized,
    {
        Query::new(self)
    }
}

/// Query builder terminated by [`Query::all`] or [`Query::first`].
#[must_use]
pub struct Query<'s, S, T> {
    store: &'s S,
    predicates: Vec<Predicate>,
    _record: PhantomData<fn() -> T>,
}

impl<'s, S: DocumentStore, T: Document> Query<'s, S, T> {
    pub const fn new(store: &'s S) -> Self {
        Self {
            store,
            predicates: Vec::new(),
            _record: PhantomData,
        }
    }

    pub fn filter(mut self, field: &'static str, op: Op, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::new(field, op, value));
        self
    }

    pub fn eq(self, field: &'static str, value: impl Into<Value>) -> Self {
        self.filter(field, Op::Eq, value)
    }

    pub fn contains(self, field: &'static str, value: impl Into<Value>) -> Self {
        self.filter(field, Op::Contains, value)
    }

    /// Runs the query and returns every match.
    pub fn all(self) -> Result<Vec<T>> {
        self.store.find(&self.predicates).map_err(|e| {
            Error::persistence(format!("failed to query {}", T::COLLECTION), e)
        })
    }

    /// Runs the query and returns the first match, or [`Error::NotFound`].
    pub fn first(self) -> Result<T> {
        let key = describe(&self.predicates);
        self.all()?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(T::ENTITY, key))
    }
}

fn describe(predicates: &[Predicate]) -> String {
    if predicates.is_empty() {
        return "any".to_string();
    }
    predicates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
