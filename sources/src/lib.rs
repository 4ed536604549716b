//! QuoteFeed Sources
//!
//! Upstream quote adapters and the coordinator that fans a fetch cycle out
//! across them.
//!
//! # Features
//!
//! - One adapter per upstream, mapping source-specific JSON fields onto [`Quote`]
//! - Bounded wait per upstream request
//! - Settle-all fan-out: one failing source never aborts the cycle
//!
//! # Example
//!
//! ```rust,ignore
//! use quotefeed_sources::{build_sources, default_sources, FetchCoordinator};
//!
//! let client = reqwest::Client::new();
//! let sources = build_sources(default_sources(), client, Duration::from_secs(5));
//! let coordinator = FetchCoordinator::new(sources);
//!
//! let report = coordinator.run_cycle().await;
//! println!("{} quotes, {} failures", report.quotes.len(), report.failures.len());
//! ```
//!
//! [`Quote`]: quotefeed_common::Quote

pub mod adapter;
pub mod registry;
pub mod fetch;
pub mod error;

pub use adapter::{HttpQuoteSource, QuoteSource};
pub use registry::{build_sources, default_sources, load_definitions, SourceDefinition};
pub use fetch::{CycleReport, FetchCoordinator, SourceFailure};
pub use error::{SourceError, SourceResult};

#[cfg(any(test, feature = "test-utils"))]
pub use adapter::MockQuoteSource;
