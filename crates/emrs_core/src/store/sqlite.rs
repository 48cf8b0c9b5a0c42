//! SQLite-backed unit of work.
//!
//! # Responsibility
//! - Buffer inserts until flush and write them inside one savepoint.
//! - Track records flushed through this session until `clear`.
//! - Auto-flush pending inserts before reads and updates.
//!
//! # Invariants
//! - A failed flush rolls back to the savepoint; its queued rows are dropped.
//! - Sessions are not shared between concurrent invocations.

use super::{
    id_list_params, BoundStatement, Entity, Predicate, RecordStore, Select, StoreError,
    StoreResult, NOW_MS_SQL,
};
use crate::model::RecordId;
use log::{debug, warn};
use rusqlite::types::{ToSql, Value};
use rusqlite::{params_from_iter, Connection};
use std::collections::HashSet;

const FLUSH_SAVEPOINT: &str = "emrs_session_flush";

struct PendingInsert {
    table: &'static str,
    sql: String,
    values: Vec<Value>,
}

/// Write-behind session over one SQLite connection.
pub struct SqliteSession<'conn> {
    conn: &'conn Connection,
    pending: Vec<PendingInsert>,
    managed: HashSet<(&'static str, RecordId)>,
}

impl<'conn> SqliteSession<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            pending: Vec::new(),
            managed: HashSet::new(),
        }
    }

    /// Number of queued, not yet flushed inserts.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of records this session still tracks.
    pub fn managed_len(&self) -> usize {
        self.managed.len()
    }

    fn write_pending(&self, pending: &[PendingInsert]) -> StoreResult<Vec<RecordId>> {
        let mut ids = Vec::with_capacity(pending.len());
        for write in pending {
            let mut stmt = self.conn.prepare_cached(&write.sql)?;
            stmt.execute(params_from_iter(write.values.iter()))?;
            ids.push(self.conn.last_insert_rowid());
        }
        Ok(ids)
    }
}

impl RecordStore for SqliteSession<'_> {
    fn persist<E: Entity>(&mut self, entity: &E) -> StoreResult<()> {
        let values = entity.insert_values();
        if values.len() != E::COLUMNS.len() {
            return Err(StoreError::InvalidData(format!(
                "{} expects {} insert values, got {}",
                E::TABLE,
                E::COLUMNS.len(),
                values.len()
            )));
        }

        self.pending.push(PendingInsert {
            table: E::TABLE,
            sql: insert_sql::<E>(),
            values,
        });
        Ok(())
    }

    fn execute_update(&mut self, statement: &BoundStatement) -> StoreResult<usize> {
        self.flush()?;

        let named: Vec<(&str, &dyn ToSql)> = statement
            .params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect();
        let mut stmt = self.conn.prepare_cached(&statement.sql)?;
        let affected = stmt.execute(named.as_slice())?;
        Ok(affected)
    }

    fn flush(&mut self) -> StoreResult<Vec<RecordId>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let pending = std::mem::take(&mut self.pending);
        self.conn
            .execute_batch(&format!("SAVEPOINT {FLUSH_SAVEPOINT};"))?;

        match self.write_pending(&pending) {
            Ok(ids) => {
                self.conn
                    .execute_batch(&format!("RELEASE {FLUSH_SAVEPOINT};"))?;
                for (write, id) in pending.iter().zip(&ids) {
                    self.managed.insert((write.table, *id));
                }
                debug!(
                    "event=session_flush module=store status=ok rows={}",
                    ids.len()
                );
                Ok(ids)
            }
            Err(err) => {
                if let Err(rollback_err) = self.conn.execute_batch(&format!(
                    "ROLLBACK TO {FLUSH_SAVEPOINT}; RELEASE {FLUSH_SAVEPOINT};"
                )) {
                    warn!(
                        "event=session_flush module=store status=error error_code=rollback_failed error={}",
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }

    fn clear(&mut self) {
        self.managed.clear();
        self.conn.flush_prepared_statement_cache();
    }

    fn query<E: Entity>(&mut self, select: &Select) -> StoreResult<Vec<E>> {
        self.flush()?;

        let mut sql = format!(
            "SELECT id, {}, created_at, updated_at FROM {}",
            E::COLUMNS.join(", "),
            E::TABLE
        );
        let mut bind_values: Vec<(String, Value)> = Vec::new();

        if let Predicate::IdIn(ids) = &select.predicate {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let (placeholders, params) = id_list_params(ids);
            sql.push_str(&format!(" WHERE id IN ({placeholders})"));
            bind_values.extend(params);
        }

        if select.order_by_id {
            sql.push_str(" ORDER BY id ASC");
        }

        if let Some(limit) = select.limit {
            sql.push_str(" LIMIT :limit OFFSET :offset");
            bind_values.push((":limit".to_string(), Value::Integer(limit)));
            bind_values.push((":offset".to_string(), Value::Integer(select.offset)));
        }

        let named: Vec<(&str, &dyn ToSql)> = bind_values
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(named.as_slice())?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let record = E::from_row(row)?;
            if let Some(id) = record.id() {
                self.managed.insert((E::TABLE, id));
            }
            records.push(record);
        }

        Ok(records)
    }

    fn count<E: Entity>(&mut self) -> StoreResult<i64> {
        self.flush()?;

        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", E::TABLE),
            [],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(count)
    }
}

impl Drop for SqliteSession<'_> {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            warn!(
                "event=session_drop module=store status=error error_code=unflushed_writes rows={}",
                self.pending.len()
            );
        }
    }
}

fn insert_sql<E: Entity>() -> String {
    let placeholders = (1..=E::COLUMNS.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}, created_at, updated_at) VALUES ({placeholders}, {NOW_MS_SQL}, {NOW_MS_SQL})",
        E::TABLE,
        E::COLUMNS.join(", ")
    )
}
