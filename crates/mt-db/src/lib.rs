//! Storage layer for mytime.
//!
//! Implements the [`mt_core::DocumentStore`] contract on top of `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! Nothing coordinates separate processes either: two `mytime` invocations
//! writing the same file at once can interleave check-then-write sequences.
//!
//! # Schema
//!
//! Every record lives in a single `documents` table keyed by
//! `(collection, id)`. The `data` column holds the record serialized as JSON;
//! predicates are evaluated with SQLite's `json_extract`/`json_type`, so adding
//! a field to a record needs no migration.
//!
//! `seq` is an autoincrementing rowid. Queries order by it, which gives
//! insertion order; updates rewrite `data` in place and keep `seq`.

use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params, params_from_iter};
use thiserror::Error;

use mt_core::{Document, DocumentStore, Op, Predicate, Value};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A record could not be serialized.
    #[error("failed to encode {collection} document {id}")]
    Encode {
        collection: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },
    /// A stored document no longer matches its record type.
    #[error("invalid {collection} document {id}")]
    Decode {
        collection: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },
    /// Update or delete targeted a document that does not exist.
    #[error("no {collection} document with id {id}")]
    Missing { collection: &'static str, id: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- documents: one row per record, JSON payload in data
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                UNIQUE (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
            ",
        )?;
        Ok(())
    }

    /// Counts the documents in `T`'s collection.
    pub fn count<T: Document>(&self) -> Result<usize, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?",
            [T::COLLECTION],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn encode<T: Document>(record: &T) -> Result<(String, String), DbError> {
        let id = record.key();
        match serde_json::to_string(record) {
            Ok(data) => Ok((id, data)),
            Err(source) => Err(DbError::Encode {
                collection: T::COLLECTION,
                id,
                source,
            }),
        }
    }
}

impl DocumentStore for Database {
    type Error = DbError;

    fn next_numeric_id<T: Document>(&self) -> Result<i64, DbError> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(CAST(id AS INTEGER)) FROM documents WHERE collection = ?",
            [T::COLLECTION],
            |row| row.get(0),
        )?;
        Ok(max.map_or(1, |id| id + 1))
    }

    fn insert<T: Document>(&self, record: &T) -> Result<(), DbError> {
        let (id, data) = Self::encode(record)?;
        self.conn.execute(
            "INSERT INTO documents (collection, id, data) VALUES (?, ?, ?)",
            params![T::COLLECTION, id, data],
        )?;
        tracing::trace!(collection = T::COLLECTION, %id, "inserted document");
        Ok(())
    }

    fn update<T: Document>(&self, record: &T) -> Result<(), DbError> {
        let (id, data) = Self::encode(record)?;
        let changed = self.conn.execute(
            "UPDATE documents SET data = ? WHERE collection = ? AND id = ?",
            params![data, T::COLLECTION, id],
        )?;
        if changed == 0 {
            return Err(DbError::Missing {
                collection: T::COLLECTION,
                id,
            });
        }
        Ok(())
    }

    fn delete<T: Document>(&self, record: &T) -> Result<(), DbError> {
        let id = record.key();
        let changed = self.conn.execute(
            "DELETE FROM documents WHERE collection = ? AND id = ?",
            params![T::COLLECTION, id],
        )?;
        if changed == 0 {
            return Err(DbError::Missing {
                collection: T::COLLECTION,
                id,
            });
        }
        Ok(())
    }

    fn find<T: Document>(&self, predicates: &[Predicate]) -> Result<Vec<T>, DbError> {
        let (sql, values) = build_find_query(T::COLLECTION, predicates);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, data) = row?;
            let record = serde_json::from_str(&data).map_err(|source| DbError::Decode {
                collection: T::COLLECTION,
                id,
                source,
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

/// Builds the SELECT for a collection and its predicates.
///
/// Field names are bound as JSON paths, never spliced into the SQL text.
fn build_find_query(collection: &str, predicates: &[Predicate]) -> (String, Vec<SqlValue>) {
    let mut sql = String::from("SELECT id, data FROM documents WHERE collection = ?");
    let mut values = vec![SqlValue::Text(collection.to_string())];

    for predicate in predicates {
        let path = SqlValue::Text(format!("$.{}", predicate.field));
        match (predicate.op, &predicate.value) {
            (Op::Eq, Value::Bool(b)) => {
                sql.push_str(" AND json_type(data, ?) = ?");
                values.push(path);
                let json_type = if *b { "true" } else { "false" };
                values.push(SqlValue::Text(json_type.to_string()));
            }
            (Op::Eq, Value::Int(n)) => {
                sql.push_str(" AND json_type(data, ?) = 'integer' AND json_extract(data, ?) = ?");
                values.push(path.clone());
                values.push(path);
                values.push(SqlValue::Integer(*n));
            }
            (Op::Eq, Value::Text(s)) => {
                sql.push_str(" AND json_type(data, ?) = 'text' AND json_extract(data, ?) = ?");
                values.push(path.clone());
                values.push(path);
                values.push(SqlValue::Text(s.clone()));
            }
            (Op::Contains, Value::Text(s)) => {
                sql.push_str(
                    " AND json_type(data, ?) = 'text' AND instr(json_extract(data, ?), ?) > 0",
                );
                values.push(path.clone());
                values.push(path);
                values.push(SqlValue::Text(s.clone()));
            }
            (Op::Contains, _) => {
                // Substring match on a non-text operand never matches.
                sql.push_str(" AND 0");
            }
        }
    }

    sql.push_str(" ORDER BY seq ASC");
    (sql, values)
}
