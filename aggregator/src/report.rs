//! Report shapes returned by the query interface.

use chrono::SecondsFormat;
use quotefeed_common::Timestamp;
use serde::{Serialize, Serializer};

/// Serialize as RFC 3339 with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
fn serialize_timestamp<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// One quote of the latest batch with its spread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteLine {
    pub buy_price: f64,
    pub sell_price: f64,
    /// `sell_price - buy_price`, 2 dp. May be negative.
    pub spread: f64,
    pub source: String,
}

/// The latest batch as served by `GET /quotes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotesReport {
    #[serde(serialize_with = "serialize_timestamp")]
    pub last_update_utc: Timestamp,
    pub quotes: Vec<QuoteLine>,
}

/// Batch means as served by `GET /average`. Prices at 2 dp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageReport {
    #[serde(serialize_with = "serialize_timestamp")]
    pub last_update_utc: Timestamp,
    pub source_count: usize,
    pub average_buy_price: f64,
    pub average_sell_price: f64,
    /// Mean of per-quote spreads.
    pub average_spread: f64,
}

/// One source's deviation from the batch mean, as a fraction at 4 dp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlippageLine {
    pub buy_price_slippage: f64,
    pub sell_price_slippage: f64,
    pub source: String,
}

/// Per-source slippage as served by `GET /slippage`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlippageReport {
    #[serde(serialize_with = "serialize_timestamp")]
    pub last_update_utc: Timestamp,
    pub slippage_analysis: Vec<SlippageLine>,
}
