//! Aggregation error types.

use quotefeed_common::QuoteFeedError;
use std::fmt;
use thiserror::Error;

/// Which price of a quote a figure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSide {
    Buy,
    Sell,
}

impl fmt::Display for PriceSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceSide::Buy => write!(f, "buy"),
            PriceSide::Sell => write!(f, "sell"),
        }
    }
}

/// Errors that can occur while computing batch statistics.
#[derive(Debug, Error, PartialEq)]
pub enum AggregationError {
    /// No quotes to aggregate.
    #[error("Cannot aggregate an empty batch")]
    EmptyBatch,

    /// Mean price is zero, slippage is undefined.
    #[error("Mean {side} price is zero, slippage is undefined")]
    DegenerateMean { side: PriceSide },

    /// A computed figure is NaN, infinite or beyond decimal range.
    #[error("Non-finite or out-of-range {figure}")]
    NonFinite { figure: &'static str },
}

impl From<AggregationError> for QuoteFeedError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::EmptyBatch => QuoteFeedError::NoData,
            other => QuoteFeedError::AggregationError(other.to_string()),
        }
    }
}

/// Result type for aggregation.
pub type AggregationResult<T> = Result<T, AggregationError>;
