//! In-memory [`DocumentStore`] used by unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use thiserror::Error;

use crate::store::{Document, DocumentStore, Predicate};

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("no {collection} record with key {key}")]
    Missing { collection: String, key: String },
    #[error("duplicate {collection} key {key}")]
    Duplicate { collection: String, key: String },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store is read-only")]
    ReadOnly,
}

/// Collections of JSON documents kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RefCell<HashMap<&'static str, Vec<(String, serde_json::Value)>>>,
    read_only: Cell<bool>,
}

impl MemoryStore {
    /// Makes every subsequent write fail.
    pub fn set_read_only(&self) {
        self.read_only.set(true);
    }

    /// Stores `value` as-is under `key`, bypassing serialization.
    pub fn insert_raw<T: Document>(&self, key: &str, value: serde_json::Value) {
        self.collections
            .borrow_mut()
            .entry(T::COLLECTION)
            .or_default()
            .push((key.to_string(), value));
    }

    pub fn count<T: Document>(&self) -> usize {
        self.collections
            .borrow()
            .get(T::COLLECTION)
            .map_or(0, Vec::len)
    }

    fn check_writable(&self) -> Result<(), MemoryError> {
        if self.read_only.get() {
            Err(MemoryError::ReadOnly)
        } else {
            Ok(())
        }
    }
}

impl DocumentStore for MemoryStore {
    type Error = MemoryError;

    fn next_numeric_id<T: Document>(&self) -> Result<i64, Self::Error> {
        let max = self
            .collections
            .borrow()
            .get(T::COLLECTION)
            .into_iter()
            .flatten()
            .filter_map(|(key, _)| key.parse::<i64>().ok())
            .max();
        Ok(max.map_or(1, |id| id + 1))
    }

    fn insert<T: Document>(&self, record: &T) -> Result<(), Self::Error> {
        self.check_writable()?;
        let key = record.key();
        let value = serde_json::to_value(record)?;
        let mut collections = self.collections.borrow_mut();
        let rows = collections.entry(T::COLLECTION).or_default();
        if rows.iter().any(|(existing, _)| *existing == key) {
            return Err(MemoryError::Duplicate {
                collection: T::COLLECTION.to_string(),
                key,
            });
        }
        rows.push((key, value));
        Ok(())
    }

    fn update<T: Document>(&self, record: &T) -> Result<(), Self::Error> {
        self.check_writable()?;
        let key = record.key();
        let value = serde_json::to_value(record)?;
        let mut collections = self.collections.borrow_mut();
        let slot = collections
            .get_mut(T::COLLECTION)
            .and_then(|rows| rows.iter_mut().find(|(existing, _)| *existing == key));
        match slot {
            Some((_, stored)) => {
                *stored = value;
                Ok(())
            }
            None => Err(MemoryError::Missing {
                collection: T::COLLECTION.to_string(),
                key,
            }),
        }
    }

    fn delete<T: Document>(&self, record: &T) -> Result<(), Self::Error> {
        self.check_writable()?;
        let key = record.key();
        let mut collections = self.collections.borrow_mut();
        let rows = collections.entry(T::COLLECTION).or_default();
        let before = rows.len();
        rows.retain(|(existing, _)| *existing != key);
        if rows.len() == before {
            return Err(MemoryError::Missing {
                collection: T::COLLECTION.to_string(),
                key,
            });
        }
        Ok(())
    }

    fn find<T: Document>(&self, predicates: &[Predicate]) -> Result<Vec<T>, Self::Error> {
        let collections = self.collections.borrow();
        let Some(rows) = collections.get(T::COLLECTION) else {
            return Ok(Vec::new());
        };
        rows.iter()
            .filter(|(_, value)| predicates.iter().all(|p| p.matches(value)))
            .map(|(_, value)| serde_json::from_value(value.clone()).map_err(MemoryError::from))
            .collect()
    }
}
