use core_types::{BookLevel, MetricResult, OrderBookSnapshot};
use serde::{Deserialize, Serialize};

/// Depth band around the midpoint: bids at or above 98%, asks at or below 102%.
pub const DEPTH_BAND_LOWER: f64 = 0.98;
pub const DEPTH_BAND_UPPER: f64 = 1.02;

/// Order-book liquidity metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidityMetrics {
    /// Best ask minus best bid, as a percentage of the midpoint.
    pub spread_pct: f64,
    /// Total bid quantity over total ask quantity; above 1 signals buy-side pressure.
    pub imbalance: f64,
    /// Notional resting within ±2% of the midpoint.
    pub depth_2pct: f64,
}

impl LiquidityMetrics {
    pub fn to_metric_result(&self) -> MetricResult {
        let mut out = MetricResult::new();
        out.insert("spread_pct", self.spread_pct);
        out.insert("imbalance", self.imbalance);
        out.insert("depth_2pct", self.depth_2pct);
        out
    }
}

/// Computes spread, imbalance and ±2% depth from an order-book snapshot.
///
/// Depth aggregation walks each side from the top of the book and stops at the first
/// level outside the band. This relies on bids being sorted descending and asks
/// ascending: an unsorted snapshot yields an undercount, not an error. Use
/// [`OrderBookSnapshot::sorted`] first to opt out of that behaviour.
pub fn liquidity(book: &OrderBookSnapshot) -> LiquidityMetrics {
    let (Some(best_bid), Some(best_ask)) = (book.best_bid(), book.best_ask()) else {
        tracing::trace!("liquidity: empty order book side");
        return LiquidityMetrics::default();
    };

    let midpoint = (best_bid.price + best_ask.price) / 2.0;
    let spread_pct = if midpoint != 0.0 {
        (best_ask.price - best_bid.price) / midpoint * 100.0
    } else {
        0.0
    };

    let total_bid_qty: f64 = book.bids.iter().map(|l| l.quantity).sum();
    let total_ask_qty: f64 = book.asks.iter().map(|l| l.quantity).sum();
    let imbalance = if total_ask_qty != 0.0 {
        total_bid_qty / total_ask_qty
    } else {
        0.0
    };

    let lower_bound = midpoint * DEPTH_BAND_LOWER;
    let upper_bound = midpoint * DEPTH_BAND_UPPER;
    let depth_2pct = banded_notional(&book.bids, |p| p >= lower_bound)
        + banded_notional(&book.asks, |p| p <= upper_bound);

    LiquidityMetrics { spread_pct, imbalance, depth_2pct }
}

/// Sums notional from the top of one side until the first level outside the band.
fn banded_notional(levels: &[BookLevel], in_band: impl Fn(f64) -> bool) -> f64 {
    levels
        .iter()
        .take_while(|l| in_band(l.price))
        .map(BookLevel::notional)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(bids: &[(f64, f64)], asks: &[(f64, f64)]) -> OrderBookSnapshot {
        OrderBookSnapshot::new(
            bids.iter().copied().map(BookLevel::from).collect(),
            asks.iter().copied().map(BookLevel::from).collect(),
        )
    }

    #[test]
    fn spread_and_imbalance_for_small_book() {
        let metrics = liquidity(&book(&[(100.0, 2.0), (99.5, 3.0)], &[(101.0, 1.0), (101.5, 1.5)]));
        assert_eq!(metrics.imbalance, 2.0);
        assert_eq!(metrics.spread_pct, (101.0 - 100.0) / 100.5 * 100.0);
        // Every level sits within 2% of 100.5.
        let expected_depth = 100.0 * 2.0 + 99.5 * 3.0 + 101.0 * 1.0 + 101.5 * 1.5;
        assert!((metrics.depth_2pct - expected_depth).abs() < 1e-9);
    }

    #[test]
    fn empty_side_yields_zeros() {
        assert_eq!(liquidity(&book(&[], &[(101.0, 1.0)])), LiquidityMetrics::default());
        assert_eq!(liquidity(&book(&[(100.0, 1.0)], &[])), LiquidityMetrics::default());
        assert_eq!(liquidity(&OrderBookSnapshot::empty()), LiquidityMetrics::default());
    }

    #[test]
    fn depth_excludes_levels_outside_the_band() {
        // midpoint 100, band [98, 102]
        let metrics = liquidity(&book(&[(99.0, 1.0), (97.0, 10.0)], &[(101.0, 1.0), (103.0, 10.0)]));
        assert!((metrics.depth_2pct - (99.0 + 101.0)).abs() < 1e-9);
    }

    #[test]
    fn zero_ask_quantity_guards_imbalance() {
        let metrics = liquidity(&book(&[(100.0, 5.0)], &[(101.0, 0.0)]));
        assert_eq!(metrics.imbalance, 0.0);
    }

    #[test]
    fn unsorted_book_truncates_depth_unless_sorted_first() {
        // The out-of-band bid at 90 comes before an in-band bid at 99.5.
        let unsorted = book(&[(100.0, 1.0), (90.0, 1.0), (99.5, 1.0)], &[(101.0, 1.0)]);

        let truncated = liquidity(&unsorted);
        assert!((truncated.depth_2pct - (100.0 + 101.0)).abs() < 1e-9);

        let sorted = liquidity(&unsorted.sorted());
        assert!((sorted.depth_2pct - (100.0 + 99.5 + 101.0)).abs() < 1e-9);

        // Spread and imbalance do not depend on depth ordering.
        assert_eq!(truncated.imbalance, sorted.imbalance);
        assert_eq!(truncated.spread_pct, sorted.spread_pct);
    }
}
