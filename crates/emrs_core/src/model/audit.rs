//! Audit lifecycle record.
//!
//! # Responsibility
//! - Describe one invocation of an auditable operation.
//! - Own the status state machine (`STARTED -> SUCCESS | FAILURE`).
//!
//! # Invariants
//! - Terminal states are final; no transition leaves them.
//! - `created_at` is set once; `updated_at >= created_at` always holds.

use super::RecordId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller id and display name recorded for unauthenticated invocations.
pub const ANONYMOUS: &str = "Anonymous";

/// Lifecycle status of one audited invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Started,
    Success,
    Failure,
}

impl AuditStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "STARTED" => Some(Self::Started),
            "SUCCESS" => Some(Self::Success),
            "FAILURE" => Some(Self::Failure),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Started)
    }
}

/// One row of the operation audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Assigned by the audit store on first save.
    pub id: Option<RecordId>,
    pub caller_id: String,
    pub caller_name: String,
    /// Human label, or the method name when no label was supplied.
    pub operation: String,
    pub method: String,
    pub ip_address: String,
    pub status: AuditStatus,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl AuditRecord {
    /// Creates a `STARTED` record stamped at `now_ms`.
    pub fn started(
        caller_id: impl Into<String>,
        caller_name: impl Into<String>,
        operation: impl Into<String>,
        method: impl Into<String>,
        ip_address: impl Into<String>,
        now_ms: i64,
    ) -> Self {
        Self {
            id: None,
            caller_id: caller_id.into(),
            caller_name: caller_name.into(),
            operation: operation.into(),
            method: method.into(),
            ip_address: ip_address.into(),
            status: AuditStatus::Started,
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Moves a `STARTED` record to a terminal status.
    ///
    /// `updated_at` never goes below `created_at`, even when the wall clock
    /// steps backwards between the two writes.
    pub fn complete(&mut self, status: AuditStatus, now_ms: i64) -> Result<(), AuditTransitionError> {
        if self.status.is_terminal() || !status.is_terminal() {
            return Err(AuditTransitionError {
                from: self.status,
                to: status,
            });
        }

        self.status = status;
        self.updated_at = now_ms.max(self.created_at);
        Ok(())
    }
}

/// Rejected audit status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditTransitionError {
    pub from: AuditStatus,
    pub to: AuditStatus,
}

impl Display for AuditTransitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "illegal audit status transition {} -> {}",
            self.from.as_str(),
            self.to.as_str()
        )
    }
}

impl Error for AuditTransitionError {}
