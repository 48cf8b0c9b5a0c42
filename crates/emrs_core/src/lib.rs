//! Records-management core.
//!
//! Chunked batch writes, sparse partial updates and id-ordered pagination over
//! SQLite, plus the operation audit trail wrapped around service calls.

pub mod audit;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use audit::{
    AuditError, AuditInterceptor, AuditQuery, AuditStore, AuditedOperation, CallerIdentity,
    InvocationContext, SqliteAuditStore,
};
pub use config::{BatchConfig, ChunkAlignment, ConfigError, CoreConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::audit::{AuditRecord, AuditStatus, AuditTransitionError, ANONYMOUS};
pub use model::department::Department;
pub use model::employee::{Employee, EmployeePatch, EmploymentStatus};
pub use model::patch::{FieldValue, Patch, UpdateTemplate};
pub use model::RecordId;
pub use repo::{
    build_update, BatchWriter, Page, PageReader, PageRequest, PreparedUpdate, RepoError,
    RepoResult,
};
pub use service::department_service::DepartmentService;
pub use service::employee_service::EmployeeService;
pub use service::OperationResult;
pub use store::{
    BoundStatement, Entity, Predicate, RecordStore, Select, SqliteSession, StoreError,
    StoreResult,
};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
