//! Relational store seam used by the batch and pagination core.
//!
//! # Responsibility
//! - Define the unit-of-work contract (`RecordStore`) the core is written
//!   against: persist, update, flush, clear, query, count.
//! - Describe record tables explicitly (`Entity`) instead of reflecting over
//!   struct fields.
//!
//! # Invariants
//! - `persist` only queues a write; nothing reaches the database before
//!   `flush` (or an auto-flushing read/update).
//! - `flush` returns generated identifiers in submission order.
//! - A store instance is owned by exactly one invocation at a time.

mod mapping;
mod sqlite;

pub use sqlite::SqliteSession;

use crate::db::DbError;
use crate::model::RecordId;
use rusqlite::types::Value;
use rusqlite::Row;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Columns maintained by the store and never written from caller input.
pub const MANAGED_COLUMNS: &[&str] = &["id", "created_at", "updated_at"];

/// SQL expression yielding the current time in Unix epoch milliseconds.
pub(crate) const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by the underlying relational store.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Table mapping for one record type.
pub trait Entity: Sized {
    const TABLE: &'static str;
    /// Caller-writable columns in insert order. Excludes `MANAGED_COLUMNS`.
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Option<RecordId>;
    fn assign_id(&mut self, id: RecordId);
    /// Business validation run before a record is queued.
    fn check_insertable(&self) -> Result<(), String>;
    /// Values for `COLUMNS`, same order.
    fn insert_values(&self) -> Vec<Value>;
    fn from_row(row: &Row<'_>) -> StoreResult<Self>;
}

/// Row filter understood by `RecordStore::query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    All,
    IdIn(Vec<RecordId>),
}

/// Select description rendered by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub predicate: Predicate,
    pub order_by_id: bool,
    pub limit: Option<i64>,
    pub offset: i64,
}

impl Select {
    pub fn ids(ids: &[RecordId]) -> Self {
        Self {
            predicate: Predicate::IdIn(ids.to_vec()),
            order_by_id: false,
            limit: None,
            offset: 0,
        }
    }

    /// Ascending-id window over the whole table.
    pub fn window(offset: i64, limit: i64) -> Self {
        Self {
            predicate: Predicate::All,
            order_by_id: true,
            limit: Some(limit),
            offset,
        }
    }
}

/// Fully bound, named-parameter statement ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub sql: String,
    /// `(":name", value)` pairs.
    pub params: Vec<(String, Value)>,
}

impl BoundStatement {
    /// `DELETE FROM <table> WHERE id IN (...)` as one statement.
    pub fn delete_by_ids(table: &str, ids: &[RecordId]) -> Self {
        let (placeholders, params) = id_list_params(ids);
        Self {
            sql: format!("DELETE FROM {table} WHERE id IN ({placeholders})"),
            params,
        }
    }
}

/// Expands an id list into `:ids_0, :ids_1, ...` with matching bindings.
pub(crate) fn id_list_params(ids: &[RecordId]) -> (String, Vec<(String, Value)>) {
    let params: Vec<(String, Value)> = ids
        .iter()
        .enumerate()
        .map(|(index, id)| (format!(":ids_{index}"), Value::Integer(*id)))
        .collect();
    let placeholders = params
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    (placeholders, params)
}

/// Unit-of-work contract over a relational store.
pub trait RecordStore {
    /// Queues `entity` for insertion.
    fn persist<E: Entity>(&mut self, entity: &E) -> StoreResult<()>;
    /// Executes an update/delete and returns the affected row count.
    fn execute_update(&mut self, statement: &BoundStatement) -> StoreResult<usize>;
    /// Writes all queued inserts; returns their generated ids in order.
    fn flush(&mut self) -> StoreResult<Vec<RecordId>>;
    /// Drops cached state held for already-flushed records.
    fn clear(&mut self);
    fn query<E: Entity>(&mut self, select: &Select) -> StoreResult<Vec<E>>;
    fn count<E: Entity>(&mut self) -> StoreResult<i64>;
}
