//! Fixed-precision rounding of reported figures.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{AggregationError, AggregationResult};

/// Round `value` to `dp` decimal places, ties away from zero.
///
/// Rounding is applied to the exact decimal expansion of the binary value,
/// so `1.005` (stored as `1.00499999...`) rounds to `1.0`, matching
/// fixed-point formatting of the same double.
pub fn round_dp(value: f64, dp: u32, figure: &'static str) -> AggregationResult<f64> {
    let exact = Decimal::from_f64_retain(value).ok_or(AggregationError::NonFinite { figure })?;

    let rounded = exact.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);

    // Parsing the decimal text yields the double nearest to the rounded value.
    let out: f64 = rounded
        .to_string()
        .parse()
        .map_err(|_| AggregationError::NonFinite { figure })?;

    // Avoid reporting -0.0.
    Ok(if out == 0.0 { 0.0 } else { out })
}
