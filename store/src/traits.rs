//! Storage traits.

use async_trait::async_trait;
use quotefeed_common::{Batch, Quote};

use crate::error::StoreResult;

/// Append-only store of quote batches.
///
/// Implementations must make `append_batch` atomic with respect to
/// `latest_batch`: a concurrent reader sees either the previous batch or
/// the new one in full. Concurrent appends are serialized.
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Write `quotes` as one batch stamped with a single commit instant.
    ///
    /// Fails with [`StoreError::EmptyBatch`](crate::StoreError::EmptyBatch)
    /// without writing anything if `quotes` is empty.
    async fn append_batch(&self, quotes: &[Quote]) -> StoreResult<Batch>;

    /// Every quote of the most recently committed batch, or `None` if no
    /// batch was ever written.
    async fn latest_batch(&self) -> StoreResult<Option<Batch>>;

    /// Number of committed batches.
    async fn batch_count(&self) -> StoreResult<u64>;
}
