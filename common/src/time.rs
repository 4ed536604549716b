//! Time utilities and constants for QuoteFeed.

use chrono::{DateTime, Duration, Utc};

/// Ingestion timing constants.
pub mod constants {
    use super::Duration;

    /// Interval between ingestion cycles (60 seconds).
    pub fn fetch_interval() -> Duration {
        Duration::seconds(60)
    }

    /// Upper bound on a single upstream request (5 seconds).
    pub fn source_timeout() -> Duration {
        Duration::seconds(5)
    }

    /// Shortest interval accepted by configuration (1 second).
    pub fn min_fetch_interval() -> Duration {
        Duration::seconds(1)
    }
}

/// Rounding precision of the query interface.
pub mod precision {
    /// Decimal places for prices, spreads and averages.
    pub const PRICE_DP: u32 = 2;

    /// Decimal places for slippage fractions.
    pub const SLIPPAGE_DP: u32 = 4;
}

/// A timestamp, always UTC.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Time elapsed since `timestamp`, clamped at zero for clock skew.
pub fn age_of(timestamp: Timestamp) -> Duration {
    let age = now() - timestamp;
    if age < Duration::zero() {
        Duration::zero()
    } else {
        age
    }
}

/// Duration extensions for convenient conversion.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}
