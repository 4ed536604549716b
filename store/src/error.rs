//! Store errors.

use quotefeed_common::QuoteFeedError;
use thiserror::Error;

/// Errors that can occur during batch store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An empty batch was offered for writing.
    #[error("Refusing to write an empty batch")]
    EmptyBatch,

    /// The store URL names no known backend.
    #[error("Unsupported store URL: {0}")]
    UnsupportedUrl(String),

    /// Stored rows violate the batch invariants.
    #[error("Corrupt store: {0}")]
    Corrupt(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for QuoteFeedError {
    fn from(err: StoreError) -> Self {
        QuoteFeedError::StoreError(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
