//! QuoteFeed Server
//!
//! Runs ingestion cycles on a fixed interval and serves statistics over the
//! latest committed batch. Reads never wait on ingestion: they only touch the
//! batch store.

pub mod service;
pub mod config;
pub mod ingest;
pub mod scheduler;
pub mod api;
pub mod state;
pub mod metrics;

pub use service::QuoteService;
pub use config::ServerConfig;
pub use ingest::{IngestOutcome, Ingestor};
