//! Records domain model.
//!
//! # Responsibility
//! - Define the records managed by the batch core (`Department`, `Employee`).
//! - Define the audit lifecycle record and the sparse partial-update template.
//!
//! # Invariants
//! - Every persisted record is identified by a store-assigned `RecordId`.
//! - `id`, `created_at` and `updated_at` are store-managed and never written
//!   from caller-supplied values.

pub mod audit;
pub mod department;
pub mod employee;
pub mod patch;

/// Store-assigned identifier shared by every record table.
pub type RecordId = i64;
