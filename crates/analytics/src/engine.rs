use crate::error::AnalyticsError;
use crate::liquidity::liquidity;
use crate::report::MarketMetrics;
use crate::risk::risk_metrics;
use crate::trend::{fibonacci_levels, macd, technical_indicators, MacdParams};
use crate::volatility::volatility;
use crate::volume::volume_change;
use core_types::{OrderBookSnapshot, PriceSeries, VolumeSeries};
use serde::{Deserialize, Serialize};

/// Tunables fixed for the lifetime of an `AnalyticsEngine`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Annualized risk-free rate used by the Sharpe and Sortino ratios.
    pub risk_free_rate: f64,
    pub macd: MacdParams,
    /// Sort the order book before measuring depth instead of trusting provider order.
    pub sort_order_book: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            macd: MacdParams::default(),
            sort_order_book: false,
        }
    }
}

/// A stateless calculator for deriving market-health metrics from one token's data.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    settings: EngineSettings,
}

impl AnalyticsEngine {
    pub fn new(settings: EngineSettings) -> Result<Self, AnalyticsError> {
        if !settings.risk_free_rate.is_finite() {
            return Err(AnalyticsError::InvalidRiskFreeRate(settings.risk_free_rate));
        }
        // Re-run the span checks in case the params were deserialized directly.
        MacdParams::new(settings.macd.fast, settings.macd.slow, settings.macd.signal)?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The main entry point: runs every metric module over one token's inputs.
    ///
    /// # Arguments
    ///
    /// * `prices` - Historical prices, ascending by time.
    /// * `volumes` - Historical volumes, positionally aligned with `prices`.
    /// * `book` - The latest order-book snapshot; may be empty.
    ///
    /// # Returns
    ///
    /// A `MarketMetrics` bundle. Short or degenerate inputs produce sentinel values
    /// rather than errors.
    pub fn analyze(
        &self,
        prices: &PriceSeries,
        volumes: &VolumeSeries,
        book: &OrderBookSnapshot,
    ) -> MarketMetrics {
        let price_vec = prices.prices();
        let volume_vec = volumes.volumes();

        tracing::debug!(
            prices = price_vec.len(),
            volumes = volume_vec.len(),
            bids = book.bids.len(),
            asks = book.asks.len(),
            "Running analytics modules"
        );

        let liquidity = if self.settings.sort_order_book {
            liquidity(&book.sorted())
        } else {
            liquidity(book)
        };

        MarketMetrics {
            volatility: volatility(&price_vec),
            technical: technical_indicators(&price_vec),
            macd: macd(&price_vec, self.settings.macd),
            fibonacci: fibonacci_levels(&price_vec),
            liquidity,
            volume: volume_change(&price_vec, &volume_vec),
            risk: risk_metrics(&price_vec, self.settings.risk_free_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use core_types::{BookLevel, PricePoint, Trend, VolumePoint};

    fn daily_series(prices: &[f64]) -> (PriceSeries, VolumeSeries) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let price_points = prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint::new(start + Duration::days(i as i64), *p))
            .collect::<Vec<_>>();
        let volume_points = prices
            .iter()
            .enumerate()
            .map(|(i, p)| VolumePoint {
                timestamp: start + Duration::days(i as i64),
                volume: p * 1_000.0,
            })
            .collect::<Vec<_>>();
        (PriceSeries::new(price_points), VolumeSeries::new(volume_points))
    }

    fn small_book() -> OrderBookSnapshot {
        OrderBookSnapshot::new(
            vec![BookLevel::new(100.0, 2.0), BookLevel::new(99.5, 3.0)],
            vec![BookLevel::new(101.0, 1.0), BookLevel::new(101.5, 1.5)],
        )
    }

    #[test]
    fn analyze_is_idempotent() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let (p, v) = daily_series(&prices);
        let engine = AnalyticsEngine::default();

        let first = engine.analyze(&p, &v, &small_book());
        let second = engine.analyze(&p, &v, &small_book());
        assert_eq!(first, second);
        assert_eq!(first.to_metric_result(), second.to_metric_result());
    }

    #[test]
    fn rising_market_produces_full_dictionary() {
        let prices: Vec<f64> = (1..=100).map(f64::from).collect();
        let (p, v) = daily_series(&prices);
        let report = AnalyticsEngine::default().analyze(&p, &v, &small_book());

        assert_eq!(report.technical.trend, Trend::Bullish);
        assert!(report.volatility.cv > 0.0);
        assert_eq!(report.liquidity.imbalance, 2.0);
        assert_eq!(report.risk.max_drawdown, Some(0.0));

        let flat = report.to_metric_result();
        for key in ["cv", "bb_width", "rsi", "macd_line", "spread_pct", "vol_change_7d", "sharpe_ratio", "fib_0.618"] {
            assert!(flat.contains(key), "missing {key}");
        }
    }

    #[test]
    fn empty_inputs_resolve_to_sentinels() {
        let report = AnalyticsEngine::default().analyze(
            &PriceSeries::default(),
            &VolumeSeries::default(),
            &OrderBookSnapshot::empty(),
        );
        assert_eq!(report, MarketMetrics::default());
    }

    #[test]
    fn sort_order_book_setting_recovers_misordered_depth() {
        let (p, v) = daily_series(&[100.0; 5]);
        let book = OrderBookSnapshot::new(
            vec![BookLevel::new(100.0, 1.0), BookLevel::new(90.0, 1.0), BookLevel::new(99.5, 1.0)],
            vec![BookLevel::new(101.0, 1.0)],
        );

        let trusting = AnalyticsEngine::default().analyze(&p, &v, &book);
        let sorting = AnalyticsEngine::new(EngineSettings { sort_order_book: true, ..Default::default() })
            .unwrap()
            .analyze(&p, &v, &book);

        assert!(sorting.liquidity.depth_2pct > trusting.liquidity.depth_2pct);
    }

    #[test]
    fn settings_are_validated() {
        let bad_rate = EngineSettings { risk_free_rate: f64::NAN, ..Default::default() };
        assert!(matches!(
            AnalyticsEngine::new(bad_rate),
            Err(AnalyticsError::InvalidRiskFreeRate(_))
        ));

        let bad_macd = EngineSettings {
            macd: MacdParams { fast: 30, slow: 26, signal: 9 },
            ..Default::default()
        };
        assert!(matches!(
            AnalyticsEngine::new(bad_macd),
            Err(AnalyticsError::InvalidParameters(_))
        ));
    }
}
