//! The canonical quote shape produced by every source adapter.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::QuoteFeedError;

/// One source's buy/sell observation in one ingestion cycle.
///
/// The commit instant is not part of the quote: it is stamped once per batch
/// by the store, so every quote of a [`Batch`](crate::Batch) shares it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Stable label of the upstream origin.
    pub source: String,
    /// Price at which the source buys.
    pub buy_price: f64,
    /// Price at which the source sells.
    pub sell_price: f64,
}

impl Quote {
    /// Create a validated quote.
    ///
    /// Both prices must be finite and strictly positive. `sell_price` may be
    /// lower than `buy_price`; the resulting negative spread is reported as-is.
    pub fn new(
        source: impl Into<String>,
        buy_price: f64,
        sell_price: f64,
    ) -> Result<Self, QuoteFeedError> {
        let source = source.into();

        if source.trim().is_empty() {
            return Err(QuoteFeedError::InvalidQuote {
                source_id: source.clone(),
                reason: "source label is empty".to_string(),
            });
        }

        for (side, price) in [("buy", buy_price), ("sell", sell_price)] {
            if !price.is_finite() || price <= 0.0 {
                return Err(QuoteFeedError::InvalidQuote {
                    source_id: source,
                    reason: format!("{} price {} is not a positive number", side, price),
                });
            }
        }

        Ok(Self {
            source,
            buy_price,
            sell_price,
        })
    }

    /// Unrounded `sell_price - buy_price`.
    pub fn spread(&self) -> f64 {
        self.sell_price - self.buy_price
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} buy={} sell={}",
            self.source, self.buy_price, self.sell_price
        )
    }
}
