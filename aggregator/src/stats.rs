//! Statistics over a committed batch.

use quotefeed_common::precision::{PRICE_DP, SLIPPAGE_DP};
use quotefeed_common::{Batch, Quote};

use crate::error::{AggregationError, AggregationResult, PriceSide};
use crate::report::{AverageReport, QuoteLine, QuotesReport, SlippageLine, SlippageReport};
use crate::rounding::round_dp;

/// Unrounded batch means.
#[derive(Debug, Clone, Copy)]
struct Means {
    buy: f64,
    sell: f64,
    /// Mean of per-quote spreads, not `sell - buy`.
    spread: f64,
}

fn means(quotes: &[Quote]) -> AggregationResult<Means> {
    if quotes.is_empty() {
        return Err(AggregationError::EmptyBatch);
    }

    let mut total_buy = 0.0;
    let mut total_sell = 0.0;
    let mut total_spread = 0.0;

    for quote in quotes {
        total_buy += quote.buy_price;
        total_sell += quote.sell_price;
        total_spread += quote.sell_price - quote.buy_price;
    }

    let count = quotes.len() as f64;

    Ok(Means {
        buy: total_buy / count,
        sell: total_sell / count,
        spread: total_spread / count,
    })
}

/// List every quote of the batch with its rounded spread.
pub fn quote_lines(batch: &Batch) -> AggregationResult<QuotesReport> {
    if batch.quotes.is_empty() {
        return Err(AggregationError::EmptyBatch);
    }

    let quotes = batch
        .quotes
        .iter()
        .map(|q| -> AggregationResult<QuoteLine> {
            Ok(QuoteLine {
                buy_price: q.buy_price,
                sell_price: q.sell_price,
                spread: round_dp(q.spread(), PRICE_DP, "spread")?,
                source: q.source.clone(),
            })
        })
        .collect::<AggregationResult<Vec<_>>>()?;

    Ok(QuotesReport {
        last_update_utc: batch.created_at,
        quotes,
    })
}

/// Mean buy price, sell price and spread of the batch.
pub fn average(batch: &Batch) -> AggregationResult<AverageReport> {
    let means = means(&batch.quotes)?;

    Ok(AverageReport {
        last_update_utc: batch.created_at,
        source_count: batch.quotes.len(),
        average_buy_price: round_dp(means.buy, PRICE_DP, "average buy price")?,
        average_sell_price: round_dp(means.sell, PRICE_DP, "average sell price")?,
        average_spread: round_dp(means.spread, PRICE_DP, "average spread")?,
    })
}

/// Signed fractional deviation of each quote from the batch means.
///
/// Fails with [`AggregationError::DegenerateMean`] if a mean price is zero.
pub fn slippage(batch: &Batch) -> AggregationResult<SlippageReport> {
    let means = means(&batch.quotes)?;

    if means.buy == 0.0 {
        return Err(AggregationError::DegenerateMean {
            side: PriceSide::Buy,
        });
    }
    if means.sell == 0.0 {
        return Err(AggregationError::DegenerateMean {
            side: PriceSide::Sell,
        });
    }

    let slippage_analysis = batch
        .quotes
        .iter()
        .map(|q| -> AggregationResult<SlippageLine> {
            let buy = (q.buy_price - means.buy) / means.buy;
            let sell = (q.sell_price - means.sell) / means.sell;

            Ok(SlippageLine {
                buy_price_slippage: round_dp(buy, SLIPPAGE_DP, "buy price slippage")?,
                sell_price_slippage: round_dp(sell, SLIPPAGE_DP, "sell price slippage")?,
                source: q.source.clone(),
            })
        })
        .collect::<AggregationResult<Vec<_>>>()?;

    Ok(SlippageReport {
        last_update_utc: batch.created_at,
        slippage_analysis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use quotefeed_common::{now, BatchId};

    fn batch_of(prices: &[(f64, f64)]) -> Batch {
        let quotes = prices
            .iter()
            .enumerate()
            .map(|(i, (buy, sell))| Quote::new(format!("source-{}", i), *buy, *sell).unwrap())
            .collect();
        Batch::new(BatchId::new(1), now(), quotes).unwrap()
    }

    #[test]
    fn test_scenario_average() {
        let batch = batch_of(&[(900.0, 905.0), (902.0, 906.0)]);

        let report = average(&batch).unwrap();

        assert_eq!(report.source_count, 2);
        assert_eq!(report.average_buy_price, 901.0);
        assert_eq!(report.average_sell_price, 905.5);
        // Spreads are 5 and 4.
        assert_eq!(report.average_spread, 4.5);
        assert_eq!(report.last_update_utc, batch.created_at);
    }

    #[test]
    fn test_scenario_slippage() {
        let batch = batch_of(&[(900.0, 905.0), (902.0, 906.0)]);

        let report = slippage(&batch).unwrap();

        let first = &report.slippage_analysis[0];
        assert_eq!(first.source, "source-0");
        assert_eq!(first.buy_price_slippage, -0.0011);
        assert_eq!(first.sell_price_slippage, -0.0006);

        let second = &report.slippage_analysis[1];
        assert_eq!(second.buy_price_slippage, 0.0011);
        assert_eq!(second.sell_price_slippage, 0.0006);
    }

    #[test]
    fn test_quote_lines_keep_negative_spread() {
        let batch = batch_of(&[(910.0, 905.25), (900.0, 905.0)]);

        let report = quote_lines(&batch).unwrap();

        assert_eq!(report.quotes[0].spread, -4.75);
        assert_eq!(report.quotes[0].buy_price, 910.0);
        assert_eq!(report.quotes[1].spread, 5.0);
    }

    #[test]
    fn test_single_quote_batch() {
        let batch = batch_of(&[(1180.0, 1200.0)]);

        let avg = average(&batch).unwrap();
        let slip = slippage(&batch).unwrap();

        assert_eq!(avg.average_spread, 20.0);
        assert_eq!(slip.slippage_analysis[0].buy_price_slippage, 0.0);
        assert_eq!(slip.slippage_analysis[0].sell_price_slippage, 0.0);
    }

    #[test]
    fn test_empty_batch() {
        let batch = Batch {
            id: BatchId::new(1),
            created_at: now(),
            quotes: Vec::new(),
        };

        assert_eq!(average(&batch), Err(AggregationError::EmptyBatch));
        assert_eq!(slippage(&batch), Err(AggregationError::EmptyBatch));
        assert_eq!(quote_lines(&batch), Err(AggregationError::EmptyBatch));
    }

    #[test]
    fn test_zero_mean_is_rejected() {
        let batch = Batch {
            id: BatchId::new(1),
            created_at: now(),
            quotes: vec![Quote {
                source: "broken".to_string(),
                buy_price: 0.0,
                sell_price: 905.0,
            }],
        };

        assert_eq!(
            slippage(&batch),
            Err(AggregationError::DegenerateMean {
                side: PriceSide::Buy
            })
        );
    }

    fn prices() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((1.0f64..5000.0, 1.0f64..5000.0), 1..8)
    }

    proptest! {
        #[test]
        fn prop_mean_spread_is_mean_of_spreads(prices in prices()) {
            let batch = batch_of(&prices);
            let spreads: f64 = prices.iter().map(|(buy, sell)| sell - buy).sum();
            let expected = round_dp(spreads / prices.len() as f64, PRICE_DP, "x").unwrap();

            prop_assert_eq!(average(&batch).unwrap().average_spread, expected);
        }

        #[test]
        fn prop_equal_buys_have_zero_slippage(buy in 1.0f64..5000.0, sells in prop::collection::vec(1.0f64..5000.0, 1..8)) {
            let prices: Vec<(f64, f64)> = sells.iter().map(|sell| (buy, *sell)).collect();
            let report = slippage(&batch_of(&prices)).unwrap();

            for line in &report.slippage_analysis {
                prop_assert_eq!(line.buy_price_slippage, 0.0);
            }
        }

        #[test]
        fn prop_slippage_sign_follows_deviation(prices in prices()) {
            let batch = batch_of(&prices);
            let mean_buy: f64 = prices.iter().map(|(buy, _)| buy).sum::<f64>() / prices.len() as f64;
            let report = slippage(&batch).unwrap();

            for ((buy, _), line) in prices.iter().zip(&report.slippage_analysis) {
                if *buy > mean_buy {
                    prop_assert!(line.buy_price_slippage >= 0.0);
                } else if *buy < mean_buy {
                    prop_assert!(line.buy_price_slippage <= 0.0);
                }
            }
        }

        #[test]
        fn prop_reports_cover_every_quote(prices in prices()) {
            let batch = batch_of(&prices);

            prop_assert_eq!(quote_lines(&batch).unwrap().quotes.len(), prices.len());
            prop_assert_eq!(slippage(&batch).unwrap().slippage_analysis.len(), prices.len());
            prop_assert_eq!(average(&batch).unwrap().source_count, prices.len());
        }
    }
}
