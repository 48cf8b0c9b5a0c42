//! Department use-case service.

use super::{in_transaction, OperationResult};
use crate::audit::{AuditInterceptor, AuditedOperation, InvocationContext, SqliteAuditStore};
use crate::config::BatchConfig;
use crate::model::department::Department;
use crate::model::RecordId;
use crate::repo::{BatchWriter, Page, PageReader, RepoResult};
use crate::store::SqliteSession;
use log::{info, warn};
use rusqlite::Connection;

pub struct DepartmentService<'conn> {
    conn: &'conn Connection,
    batch: BatchConfig,
    audit: AuditInterceptor<SqliteAuditStore<'conn>>,
}

impl<'conn> DepartmentService<'conn> {
    pub fn new(conn: &'conn Connection, batch: BatchConfig) -> Self {
        Self {
            conn,
            batch,
            audit: AuditInterceptor::new(SqliteAuditStore::new(conn)),
        }
    }

    pub fn create_departments(
        &self,
        ctx: &InvocationContext,
        departments: Vec<Department>,
    ) -> RepoResult<Vec<Department>> {
        self.audit
            .run(ctx, &AuditedOperation::new("create_departments"), || {
                info!(
                    "event=create_departments module=service status=start rows={}",
                    departments.len()
                );
                in_transaction(self.conn, |session| {
                    BatchWriter::new(session, self.batch).insert_batch(departments)
                })
            })
    }

    /// Deletes departments by id. Departments still referenced by employees
    /// fail with a store constraint error and nothing is deleted.
    pub fn delete_departments(
        &self,
        ctx: &InvocationContext,
        ids: &[RecordId],
    ) -> RepoResult<OperationResult> {
        self.audit
            .run(ctx, &AuditedOperation::new("delete_departments"), || {
                if ids.is_empty() {
                    warn!("event=delete_departments module=service status=skip reason=empty_ids");
                    return Ok(OperationResult::with_message(
                        0,
                        "No department IDs provided.",
                    ));
                }
                let affected = in_transaction(self.conn, |session| {
                    BatchWriter::new(session, self.batch).delete_batch::<Department>(ids)
                })
                .map_err(|err| {
                    if err.is_constraint_violation() {
                        warn!(
                            "event=delete_departments module=service status=error reason=still_referenced ids={}",
                            ids.len()
                        );
                    }
                    err
                })?;
                Ok(OperationResult::with_message(
                    affected,
                    "Delete operation completed successfully.",
                ))
            })
    }

    pub fn find_departments(
        &self,
        ctx: &InvocationContext,
        ids: &[RecordId],
    ) -> RepoResult<Vec<Department>> {
        self.audit
            .run(ctx, &AuditedOperation::new("find_departments"), || {
                let mut session = SqliteSession::new(self.conn);
                BatchWriter::new(&mut session, self.batch).find_by_ids(ids)
            })
    }

    pub fn departments_page(&self, page: i64, size: i64) -> RepoResult<Page<Department>> {
        let mut session = SqliteSession::new(self.conn);
        PageReader::new(&mut session).page(page, size)
    }
}
