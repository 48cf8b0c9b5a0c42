//! Batch persistence core.
//!
//! # Responsibility
//! - Stream record collections through a `RecordStore` in bounded chunks.
//! - Build parameterized partial updates from sparse templates.
//! - Serve deterministic, id-ordered pages.
//!
//! # Invariants
//! - Store errors propagate unchanged; nothing here retries.
//! - Empty inputs are no-ops that never touch the store.

pub mod batch;
pub mod error;
pub mod page;
pub mod update_builder;

pub use batch::BatchWriter;
pub use error::{RepoError, RepoResult};
pub use page::{Page, PageReader, PageRequest};
pub use update_builder::{build_update, PreparedUpdate};

