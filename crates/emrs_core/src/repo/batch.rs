//! Chunked batch writer.
//!
//! # Responsibility
//! - Insert record collections with periodic flush+clear to bound the
//!   session's memory.
//! - Delete and look up records by id list in single set-based statements.
//! - Apply a prepared partial update over id lists, one chunk at a time.
//!
//! # Invariants
//! - Records are submitted in input order; each is persisted exactly once.
//! - Chunks run strictly sequentially against one store.
//! - Chunk boundaries bound memory only; they are not transaction boundaries.

use super::error::{RepoError, RepoResult};
use super::update_builder::PreparedUpdate;
use crate::config::BatchConfig;
use crate::model::RecordId;
use crate::store::{BoundStatement, Entity, RecordStore, Select, StoreError};
use log::{debug, info};
use std::time::Instant;

/// Chunked write/read façade over one `RecordStore`.
pub struct BatchWriter<'s, S: RecordStore> {
    store: &'s mut S,
    config: BatchConfig,
}

impl<'s, S: RecordStore> BatchWriter<'s, S> {
    pub fn new(store: &'s mut S, config: BatchConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> BatchConfig {
        self.config
    }

    /// Persists every record and returns them with generated ids assigned.
    ///
    /// An empty input is returned unchanged without touching the store. All
    /// records are validated before the first one is queued. Writes already
    /// pending on the store are flushed first and keep their own ids.
    pub fn insert_batch<E: Entity>(&mut self, mut records: Vec<E>) -> RepoResult<Vec<E>> {
        debug!(
            "event=batch_insert module=repo status=start table={} rows={} chunk_size={} alignment={:?}",
            E::TABLE,
            records.len(),
            self.config.chunk_size,
            self.config.alignment
        );
        if records.is_empty() {
            return Ok(records);
        }

        for (index, record) in records.iter().enumerate() {
            record
                .check_insertable()
                .map_err(|message| RepoError::Validation(format!("record {index}: {message}")))?;
        }

        // Writes queued on this store before the batch must not absorb its ids.
        let earlier = self.store.flush()?;
        if !earlier.is_empty() {
            debug!(
                "event=batch_insert module=repo status=flush_prior table={} rows={}",
                E::TABLE,
                earlier.len()
            );
        }

        let started_at = Instant::now();
        let mut assigned = 0;
        let mut cycles = 0;
        for index in 0..records.len() {
            self.store.persist(&records[index])?;

            if self.config.flush_after(index) {
                let ids = self.store.flush()?;
                assigned = assign_ids(&mut records, assigned, ids)?;
                self.store.clear();
                cycles += 1;
            }
        }

        let ids = self.store.flush()?;
        assigned = assign_ids(&mut records, assigned, ids)?;

        info!(
            "event=batch_insert module=repo status=ok table={} rows={} flush_cycles={} duration_ms={}",
            E::TABLE,
            assigned,
            cycles,
            started_at.elapsed().as_millis()
        );
        Ok(records)
    }

    /// Deletes all rows whose id is in `ids` with one statement.
    pub fn delete_batch<E: Entity>(&mut self, ids: &[RecordId]) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let affected = self
            .store
            .execute_update(&BoundStatement::delete_by_ids(E::TABLE, ids))?;
        info!(
            "event=batch_delete module=repo status=ok table={} requested={} affected={}",
            E::TABLE,
            ids.len(),
            affected
        );
        Ok(affected)
    }

    /// Loads all rows whose id is in `ids`, in store-defined order.
    pub fn find_by_ids<E: Entity>(&mut self, ids: &[RecordId]) -> RepoResult<Vec<E>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self.store.query(&Select::ids(ids))?)
    }

    /// Executes `update` once per chunk of `ids`, flushing and clearing after
    /// every chunk, and returns the summed affected-row count.
    pub fn apply_batched_update(
        &mut self,
        update: &PreparedUpdate,
        ids: &[RecordId],
    ) -> RepoResult<usize> {
        let started_at = Instant::now();
        let mut total = 0;
        let mut chunks = 0;

        for chunk in ids.chunks(self.config.chunk_size.get()) {
            total += self.store.execute_update(&update.bind_ids(chunk))?;
            self.store.flush()?;
            self.store.clear();
            chunks += 1;
        }

        info!(
            "event=batch_update module=repo status=ok table={} columns={} ids={} chunks={} affected={} duration_ms={}",
            update.table(),
            update.columns().join(","),
            ids.len(),
            chunks,
            total,
            started_at.elapsed().as_millis()
        );
        Ok(total)
    }
}

/// Assigns `ids` to `records[from..]`, returning the new assigned watermark.
fn assign_ids<E: Entity>(
    records: &mut [E],
    from: usize,
    ids: Vec<RecordId>,
) -> Result<usize, StoreError> {
    let remaining = records.len() - from;
    if ids.len() > remaining {
        return Err(StoreError::InvalidData(format!(
            "store returned {} generated ids for {} outstanding {} rows",
            ids.len(),
            remaining,
            E::TABLE
        )));
    }

    let count = ids.len();
    for (record, id) in records[from..].iter_mut().zip(ids) {
        record.assign_id(id);
    }
    Ok(from + count)
}
