//! QuoteFeed Batch Store
//!
//! Persists each ingestion cycle as one atomic batch and answers
//! "latest complete batch" reads.

pub mod traits;
pub mod sqlite;
pub mod memory;
pub mod error;

use std::sync::Arc;

pub use traits::BatchStore;
pub use sqlite::SqliteBatchStore;
pub use memory::MemoryBatchStore;
pub use error::{StoreError, StoreResult};

/// URL selecting the in-process store.
pub const MEMORY_URL: &str = "memory";

/// Open the store named by `url`.
///
/// `memory` selects [`MemoryBatchStore`]; `sqlite:` URLs select
/// [`SqliteBatchStore`].
pub async fn open(url: &str) -> StoreResult<Arc<dyn BatchStore>> {
    if url == MEMORY_URL {
        return Ok(Arc::new(MemoryBatchStore::new()));
    }

    if url.starts_with("sqlite:") {
        return Ok(Arc::new(SqliteBatchStore::connect(url).await?));
    }

    Err(StoreError::UnsupportedUrl(url.to_string()))
}
