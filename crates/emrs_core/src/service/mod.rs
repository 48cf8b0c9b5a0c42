//! Records use-case services.
//!
//! # Responsibility
//! - Compose the batch core and the audit interceptor into use-case APIs.
//! - Own the business transaction boundary of each call.
//!
//! # Invariants
//! - Audit records are written outside the business transaction, so a
//!   rolled-back call still leaves its `FAILURE` record.
//! - Each call gets its own `SqliteSession`; sessions are never shared.

pub mod department_service;
pub mod employee_service;

use crate::repo::RepoResult;
use crate::store::{RecordStore, SqliteSession};
use rusqlite::Connection;
use serde::Serialize;

/// Outcome of a set-based mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub affected_records: usize,
    pub message: String,
}

impl OperationResult {
    pub fn of(affected_records: usize) -> Self {
        Self::with_message(affected_records, "Operation completed successfully.")
    }

    pub fn with_message(affected_records: usize, message: impl Into<String>) -> Self {
        Self {
            affected_records,
            message: message.into(),
        }
    }
}

/// Runs `work` in a fresh session inside one transaction.
///
/// Commits when `work` succeeds (after flushing the session) and rolls back
/// otherwise.
fn in_transaction<T>(
    conn: &Connection,
    work: impl FnOnce(&mut SqliteSession<'_>) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = conn.unchecked_transaction()?;
    let value = {
        let mut session = SqliteSession::new(&tx);
        let value = work(&mut session)?;
        session.flush()?;
        value
    };
    tx.commit()?;
    Ok(value)
}
