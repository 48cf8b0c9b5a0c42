//! Audit record persistence.
//!
//! # Responsibility
//! - Insert `STARTED` records and apply their single terminal update.
//! - Provide read-only filtered access for reporting tooling.
//!
//! # Invariants
//! - Records are never deleted here.
//! - The terminal update only applies to rows still in `STARTED`.

use crate::db::DbError;
use crate::model::audit::{AuditRecord, AuditStatus};
use crate::model::RecordId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const AUDIT_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    username,
    operation,
    method,
    ip_address,
    status,
    created_at,
    updated_at
FROM user_logs";

#[derive(Debug)]
pub enum AuditError {
    Db(DbError),
    /// Update requested for a record that was never saved.
    Unsaved,
    /// No `STARTED` row with this id exists.
    NotStarted(RecordId),
    InvalidData(String),
}

impl Display for AuditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unsaved => write!(f, "audit record has no id; save it first"),
            Self::NotStarted(id) => write!(f, "audit record {id} is not in STARTED state"),
            Self::InvalidData(message) => write!(f, "invalid persisted audit data: {message}"),
        }
    }
}

impl Error for AuditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for AuditError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Reporting filter over audit records. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditQuery {
    pub operation: Option<String>,
    pub caller_id: Option<String>,
    pub status: Option<AuditStatus>,
    /// Inclusive lower bound on `created_at` (epoch ms).
    pub created_from: Option<i64>,
    /// Exclusive upper bound on `created_at` (epoch ms).
    pub created_until: Option<i64>,
    pub limit: Option<u32>,
}

/// Audit record sink.
pub trait AuditStore {
    /// Inserts `record` and assigns its id.
    fn save(&self, record: &mut AuditRecord) -> Result<(), AuditError>;
    /// Writes the terminal status and `updated_at` of a saved record.
    fn update(&self, record: &AuditRecord) -> Result<(), AuditError>;
    /// Lists records ordered by ascending id.
    fn list(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError>;
}

/// SQLite-backed audit sink on the `user_logs` table.
pub struct SqliteAuditStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAuditStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AuditStore for SqliteAuditStore<'_> {
    fn save(&self, record: &mut AuditRecord) -> Result<(), AuditError> {
        self.conn.execute(
            "INSERT INTO user_logs (
                user_id,
                username,
                operation,
                method,
                ip_address,
                status,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                record.caller_id.as_str(),
                record.caller_name.as_str(),
                record.operation.as_str(),
                record.method.as_str(),
                record.ip_address.as_str(),
                record.status.as_str(),
                record.created_at,
                record.updated_at,
            ],
        )?;

        record.id = Some(self.conn.last_insert_rowid());
        Ok(())
    }

    fn update(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let id = record.id.ok_or(AuditError::Unsaved)?;

        let changed = self.conn.execute(
            "UPDATE user_logs
             SET
                status = ?1,
                updated_at = ?2
             WHERE id = ?3
               AND status = 'STARTED';",
            params![record.status.as_str(), record.updated_at, id],
        )?;

        if changed == 0 {
            return Err(AuditError::NotStarted(id));
        }
        Ok(())
    }

    fn list(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        let mut sql = format!("{AUDIT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(operation) = query.operation.as_ref() {
            sql.push_str(" AND operation = ?");
            bind_values.push(Value::Text(operation.clone()));
        }
        if let Some(caller_id) = query.caller_id.as_ref() {
            sql.push_str(" AND user_id = ?");
            bind_values.push(Value::Text(caller_id.clone()));
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(from) = query.created_from {
            sql.push_str(" AND created_at >= ?");
            bind_values.push(Value::Integer(from));
        }
        if let Some(until) = query.created_until {
            sql.push_str(" AND created_at < ?");
            bind_values.push(Value::Integer(until));
        }

        sql.push_str(" ORDER BY id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_audit_row(row)?);
        }

        Ok(records)
    }
}

fn parse_audit_row(row: &Row<'_>) -> Result<AuditRecord, AuditError> {
    let status_text: String = row.get("status")?;
    let status = AuditStatus::parse(&status_text).ok_or_else(|| {
        AuditError::InvalidData(format!("invalid status `{status_text}` in user_logs.status"))
    })?;

    Ok(AuditRecord {
        id: Some(row.get("id")?),
        caller_id: row.get("user_id")?,
        caller_name: row.get("username")?,
        operation: row.get("operation")?,
        method: row.get("method")?,
        ip_address: row.get("ip_address")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
