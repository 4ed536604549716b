//! QuoteFeed Aggregator
//!
//! Pure statistics over one committed batch. Every report is computed from
//! exactly one [`Batch`] snapshot and carries its commit instant, so the
//! figures of a response can never mix two batches.
//!
//! # Example
//!
//! ```rust,ignore
//! use quotefeed_aggregator::{average, slippage};
//!
//! let batch = store.latest_batch().await?.ok_or(QuoteFeedError::NoData)?;
//! let avg = average(&batch)?;
//! let slip = slippage(&batch)?;
//! ```
//!
//! [`Batch`]: quotefeed_common::Batch

pub mod stats;
pub mod report;
pub mod rounding;
pub mod error;

pub use stats::{average, quote_lines, slippage};
pub use report::{AverageReport, QuoteLine, QuotesReport, SlippageLine, SlippageReport};
pub use rounding::round_dp;
pub use error::{AggregationError, AggregationResult, PriceSide};
