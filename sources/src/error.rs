//! Source adapter error types.

use quotefeed_common::QuoteFeedError;
use thiserror::Error;

/// Errors an upstream source can report for one fetch.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("Request to {source_id} failed: {message}")]
    Http { source_id: String, message: String },

    /// The upstream did not answer within the adapter's bound.
    #[error("Request to {source_id} timed out after {timeout_ms}ms")]
    Timeout { source_id: String, timeout_ms: u64 },

    /// The upstream answered with a non-success status.
    #[error("Source {source_id} returned HTTP {status}")]
    Status { source_id: String, status: u16 },

    /// The body was not JSON or lacked usable prices.
    #[error("Malformed payload from {source_id}: {reason}")]
    MalformedPayload { source_id: String, reason: String },

    /// A source definition cannot be used.
    #[error("Invalid source definition {label}: {reason}")]
    InvalidDefinition { label: String, reason: String },
}

impl SourceError {
    /// Label of the source (or definition) that failed.
    pub fn source_id(&self) -> &str {
        match self {
            SourceError::Http { source_id, .. }
            | SourceError::Timeout { source_id, .. }
            | SourceError::Status { source_id, .. }
            | SourceError::MalformedPayload { source_id, .. } => source_id,
            SourceError::InvalidDefinition { label, .. } => label,
        }
    }

    /// Short classification used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Http { .. } => "http",
            SourceError::Timeout { .. } => "timeout",
            SourceError::Status { .. } => "status",
            SourceError::MalformedPayload { .. } => "malformed",
            SourceError::InvalidDefinition { .. } => "definition",
        }
    }
}

impl From<SourceError> for QuoteFeedError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::InvalidDefinition { .. } => {
                QuoteFeedError::ConfigurationError(err.to_string())
            }
            SourceError::Timeout { .. } => QuoteFeedError::Timeout(err.to_string()),
            other => QuoteFeedError::SourceFailed {
                source_id: other.source_id().to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;
