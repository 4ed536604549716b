//! Error taxonomy shared by QuoteFeed components.

use thiserror::Error;

/// Main error type surfaced to the query and scheduling layers.
#[derive(Error, Debug)]
pub enum QuoteFeedError {
    /// A quote failed validation.
    #[error("Invalid quote from {source_id}: {reason}")]
    InvalidQuote { source_id: String, reason: String },

    /// An upstream source failed to produce a quote.
    #[error("Source {source_id} failed: {message}")]
    SourceFailed { source_id: String, message: String },

    /// No batch has ever been committed.
    #[error("No data available")]
    NoData,

    /// The batch store rejected or failed an operation.
    #[error("Store error: {0}")]
    StoreError(String),

    /// Statistics could not be computed from a batch.
    #[error("Aggregation error: {0}")]
    AggregationError(String),

    /// Timeout.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl QuoteFeedError {
    /// Check if a later ingestion cycle may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QuoteFeedError::SourceFailed { .. }
                | QuoteFeedError::StoreError(_)
                | QuoteFeedError::Timeout(_)
        )
    }

    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            QuoteFeedError::InvalidQuote { .. } => "INVALID_QUOTE",
            QuoteFeedError::SourceFailed { .. } => "SOURCE_FAILED",
            QuoteFeedError::NoData => "NO_DATA",
            QuoteFeedError::StoreError(_) => "STORE_ERROR",
            QuoteFeedError::AggregationError(_) => "AGGREGATION_ERROR",
            QuoteFeedError::Timeout(_) => "TIMEOUT",
            QuoteFeedError::ConfigurationError(_) => "CONFIGURATION_ERROR",
        }
    }
}

/// Result type alias for QuoteFeed operations.
pub type Result<T> = std::result::Result<T, QuoteFeedError>;
