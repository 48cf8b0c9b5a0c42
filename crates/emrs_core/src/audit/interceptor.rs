//! Audit wrapper around explicit operations.
//!
//! # Responsibility
//! - Write a `STARTED` record, run the operation, then move the same record
//!   to `SUCCESS` or `FAILURE`.
//!
//! # Invariants
//! - The operation's `Ok`/`Err` value is returned untouched.
//! - A panicking operation is recorded as `FAILURE` and the panic resumes.
//! - Audit store errors are logged and swallowed.

use super::context::InvocationContext;
use super::store::AuditStore;
use crate::model::audit::{AuditRecord, AuditStatus};
use log::{info, warn};
use std::panic::{self, AssertUnwindSafe};

/// Name of one auditable operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditedOperation {
    label: Option<String>,
    method: &'static str,
}

impl AuditedOperation {
    /// Operation identified only by its method name.
    pub fn new(method: &'static str) -> Self {
        Self {
            label: None,
            method,
        }
    }

    /// Attaches a human-readable label.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Label when non-blank, otherwise the method name.
    pub fn name(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.trim().is_empty() => label,
            _ => self.method,
        }
    }
}

/// Wraps operations with audit lifecycle records.
pub struct AuditInterceptor<A: AuditStore> {
    store: A,
    clock: fn() -> i64,
}

impl<A: AuditStore> AuditInterceptor<A> {
    pub fn new(store: A) -> Self {
        Self::with_clock(store, now_ms)
    }

    /// Uses `clock` (epoch milliseconds) for record timestamps.
    pub fn with_clock(store: A, clock: fn() -> i64) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &A {
        &self.store
    }

    /// Runs `operation` under an audit record and returns its result as-is.
    pub fn run<T, E, F>(
        &self,
        ctx: &InvocationContext,
        operation: &AuditedOperation,
        call: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        info!(
            "event=audit_invoke module=audit status=start operation=\"{}\" method={} caller_id={} caller_name={} ip={}",
            operation.name(),
            operation.method(),
            ctx.caller_id(),
            ctx.caller_name(),
            ctx.origin()
        );

        let mut record = AuditRecord::started(
            ctx.caller_id(),
            ctx.caller_name(),
            operation.name(),
            operation.method(),
            ctx.origin(),
            (self.clock)(),
        );
        let saved = match self.store.save(&mut record) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "event=audit_write module=audit status=error phase=start method={} error={}",
                    operation.method(),
                    err
                );
                false
            }
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(call));
        let status = match &outcome {
            Ok(Ok(_)) => AuditStatus::Success,
            Ok(Err(_)) | Err(_) => AuditStatus::Failure,
        };

        if saved {
            self.finish(&mut record, status);
        }

        info!(
            "event=audit_invoke module=audit status={} method={}",
            status.as_str().to_ascii_lowercase(),
            operation.method()
        );

        match outcome {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    fn finish(&self, record: &mut AuditRecord, status: AuditStatus) {
        if let Err(err) = record.complete(status, (self.clock)()) {
            warn!(
                "event=audit_write module=audit status=error phase=finish method={} error={}",
                record.method, err
            );
            return;
        }

        if let Err(err) = self.store.update(record) {
            warn!(
                "event=audit_write module=audit status=error phase=finish method={} error={}",
                record.method, err
            );
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
