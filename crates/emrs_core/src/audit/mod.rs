//! Operation audit trail.
//!
//! # Responsibility
//! - Resolve caller identity and origin from an explicit invocation context.
//! - Wrap auditable operations with `STARTED -> SUCCESS | FAILURE` bookkeeping.
//! - Persist and expose audit records for reporting.
//!
//! # Invariants
//! - Exactly one record per invocation, written before the operation runs.
//! - The wrapped operation's result or error is returned unchanged.
//! - Audit write failures are logged and never abort the operation.

pub mod context;
pub mod interceptor;
pub mod store;

pub use context::{CallerIdentity, InvocationContext, DISPLAY_NAME_CLAIM};
pub use interceptor::{AuditInterceptor, AuditedOperation};
pub use store::{AuditError, AuditQuery, AuditStore, SqliteAuditStore};
