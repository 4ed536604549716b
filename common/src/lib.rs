//! QuoteFeed Common Types
//!
//! This crate contains the types shared by every QuoteFeed component:
//! the canonical [`Quote`], the persisted [`Batch`] and its identifier,
//! the error taxonomy surfaced to the query layer, and timing constants.

pub mod quote;
pub mod batch;
pub mod error;
pub mod time;

pub use quote::*;
pub use batch::*;
pub use error::*;
pub use time::*;
