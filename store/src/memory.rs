//! In-process batch store.

use async_trait::async_trait;
use parking_lot::RwLock;
use quotefeed_common::{now, Batch, BatchId, Quote};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::traits::BatchStore;

/// Batch store held in memory.
///
/// A single `RwLock` guards the batch list, so a write is published to
/// readers all at once.
pub struct MemoryBatchStore {
    batches: RwLock<Vec<Batch>>,
}

impl MemoryBatchStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            batches: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryBatchStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatchStore for MemoryBatchStore {
    async fn append_batch(&self, quotes: &[Quote]) -> StoreResult<Batch> {
        if quotes.is_empty() {
            return Err(StoreError::EmptyBatch);
        }

        let mut batches = self.batches.write();
        let id = batches
            .last()
            .map(|b| b.id.next())
            .unwrap_or_else(|| BatchId::new(1));

        let batch = Batch::new(id, now(), quotes.to_vec()).ok_or(StoreError::EmptyBatch)?;
        batches.push(batch.clone());

        info!(batch_id = %batch.id, quotes = batch.len(), "Batch committed");
        Ok(batch)
    }

    async fn latest_batch(&self) -> StoreResult<Option<Batch>> {
        let latest = self.batches.read().last().cloned();
        debug!(found = latest.is_some(), "Read latest batch");
        Ok(latest)
    }

    async fn batch_count(&self) -> StoreResult<u64> {
        Ok(self.batches.read().len() as u64)
    }
}
