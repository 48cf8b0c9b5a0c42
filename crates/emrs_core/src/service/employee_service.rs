//! Employee use-case service.
//!
//! # Responsibility
//! - Batch create/delete/find/update employees under audit.
//! - Serve id-ordered employee pages.

use super::{in_transaction, OperationResult};
use crate::audit::{AuditInterceptor, AuditedOperation, InvocationContext, SqliteAuditStore};
use crate::config::BatchConfig;
use crate::model::employee::{Employee, EmployeePatch};
use crate::model::RecordId;
use crate::repo::{build_update, BatchWriter, Page, PageReader, RepoError, RepoResult};
use crate::store::SqliteSession;
use log::info;
use rusqlite::Connection;

pub struct EmployeeService<'conn> {
    conn: &'conn Connection,
    batch: BatchConfig,
    audit: AuditInterceptor<SqliteAuditStore<'conn>>,
}

impl<'conn> EmployeeService<'conn> {
    pub fn new(conn: &'conn Connection, batch: BatchConfig) -> Self {
        Self::with_audit(conn, batch, AuditInterceptor::new(SqliteAuditStore::new(conn)))
    }

    pub fn with_audit(
        conn: &'conn Connection,
        batch: BatchConfig,
        audit: AuditInterceptor<SqliteAuditStore<'conn>>,
    ) -> Self {
        Self { conn, batch, audit }
    }

    /// Inserts `employees` in chunks and returns them with ids assigned.
    pub fn create_employees_in_batch(
        &self,
        ctx: &InvocationContext,
        employees: Vec<Employee>,
    ) -> RepoResult<Vec<Employee>> {
        let operation =
            AuditedOperation::new("create_employees_in_batch").labeled("Create employees in batch");
        self.audit.run(ctx, &operation, || {
            in_transaction(self.conn, |session| {
                BatchWriter::new(session, self.batch).insert_batch(employees)
            })
        })
    }

    /// Deletes employees by id; an empty list affects nothing.
    pub fn delete_employees(
        &self,
        ctx: &InvocationContext,
        ids: &[RecordId],
    ) -> RepoResult<OperationResult> {
        let operation =
            AuditedOperation::new("delete_employees").labeled("Delete employees in batch");
        self.audit.run(ctx, &operation, || {
            if ids.is_empty() {
                return Ok(OperationResult::of(0));
            }
            let affected = in_transaction(self.conn, |session| {
                BatchWriter::new(session, self.batch).delete_batch::<Employee>(ids)
            })?;
            Ok(OperationResult::of(affected))
        })
    }

    /// Loads employees by id.
    pub fn find_employees(
        &self,
        ctx: &InvocationContext,
        ids: &[RecordId],
    ) -> RepoResult<Vec<Employee>> {
        self.audit
            .run(ctx, &AuditedOperation::new("find_employees"), || {
                let mut session = SqliteSession::new(self.conn);
                BatchWriter::new(&mut session, self.batch).find_by_ids(ids)
            })
    }

    /// Returns one page of employees ordered by id.
    pub fn employees_page(&self, page: i64, size: i64) -> RepoResult<Page<Employee>> {
        info!("event=employees_page module=service status=start page={page} size={size}");
        let mut session = SqliteSession::new(self.conn);
        PageReader::new(&mut session).page(page, size)
    }

    /// Applies `patch` to every employee in `ids`.
    ///
    /// # Errors
    /// - `Validation` when `ids` is empty or a set field breaks the
    ///   employee field rules.
    /// - `NoUpdatableFields` when `patch` sets nothing.
    pub fn update_employees_in_batch(
        &self,
        ctx: &InvocationContext,
        ids: &[RecordId],
        patch: EmployeePatch,
    ) -> RepoResult<OperationResult> {
        let operation = AuditedOperation::new("update_employees_in_batch")
            .labeled("Update employees in batch");
        self.audit.run(ctx, &operation, || {
            if ids.is_empty() {
                return Err(RepoError::Validation(
                    "employee id list must not be empty".to_string(),
                ));
            }
            patch
                .validate()
                .map_err(|err| RepoError::Validation(err.to_string()))?;
            let update = build_update::<Employee>(&patch.into_template())?;
            let affected = in_transaction(self.conn, |session| {
                BatchWriter::new(session, self.batch).apply_batched_update(&update, ids)
            })?;
            Ok(OperationResult::of(affected))
        })
    }
}
