//! Batch identifiers and the committed batch view.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::quote::Quote;
use crate::time::Timestamp;

/// Identifier of a committed batch.
///
/// Assigned by the store at write time and strictly increasing, so the
/// greatest identifier always names the most recent ingestion cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BatchId(i64);

impl BatchId {
    /// Wrap a raw store-assigned identifier.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw identifier.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// The identifier following this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// All quotes written by one ingestion cycle.
///
/// Never empty: an ingestion cycle without quotes writes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Store-assigned identifier.
    pub id: BatchId,
    /// Commit instant shared by every quote in the batch.
    pub created_at: Timestamp,
    /// The quotes, in write order.
    pub quotes: Vec<Quote>,
}

impl Batch {
    /// Assemble a batch. Returns `None` if `quotes` is empty.
    pub fn new(id: BatchId, created_at: Timestamp, quotes: Vec<Quote>) -> Option<Self> {
        if quotes.is_empty() {
            return None;
        }
        Some(Self {
            id,
            created_at,
            quotes,
        })
    }

    /// Number of sources that contributed.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Always false for a constructed batch.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
