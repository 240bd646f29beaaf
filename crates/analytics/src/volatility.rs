use crate::series;
use core_types::MetricResult;
use serde::{Deserialize, Serialize};

/// Minimum series length for the volatility metrics, and the Bollinger window.
pub const BOLLINGER_WINDOW: usize = 20;
/// Band distance from the moving average, in standard deviations.
pub const BOLLINGER_STD_MULTIPLIER: f64 = 2.0;

/// Scale-free volatility of a price series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VolatilityMetrics {
    /// Coefficient of variation: sample std / mean.
    pub cv: f64,
    /// Width of the 20-period Bollinger Bands as a percentage of the middle band.
    pub bb_width: f64,
}

impl VolatilityMetrics {
    pub fn to_metric_result(&self) -> MetricResult {
        let mut out = MetricResult::new();
        out.insert("cv", self.cv);
        out.insert("bb_width", self.bb_width);
        out
    }
}

/// Computes the coefficient of variation and Bollinger Band width.
///
/// Fewer than 20 prices yields the "no signal" default of zeros.
pub fn volatility(prices: &[f64]) -> VolatilityMetrics {
    if prices.len() < BOLLINGER_WINDOW {
        tracing::trace!(points = prices.len(), "volatility: not enough data");
        return VolatilityMetrics::default();
    }

    let mean = series::mean(prices).unwrap_or(0.0);
    let std = series::sample_std(prices).unwrap_or(0.0);
    let cv = if mean != 0.0 { std / mean } else { 0.0 };

    let bb_width = match (
        series::trailing_mean(prices, BOLLINGER_WINDOW),
        series::trailing_std(prices, BOLLINGER_WINDOW),
    ) {
        (Some(sma), Some(std_20)) if sma != 0.0 => {
            let upper = sma + BOLLINGER_STD_MULTIPLIER * std_20;
            let lower = sma - BOLLINGER_STD_MULTIPLIER * std_20;
            (upper - lower) / sma * 100.0
        }
        _ => 0.0,
    };

    VolatilityMetrics { cv, bb_width }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oscillating() -> Vec<f64> {
        vec![
            100.0, 110.0, 90.0, 105.0, 95.0, 100.0, 110.0, 90.0, 105.0, 95.0, 100.0, 110.0, 90.0,
            105.0, 95.0, 100.0, 110.0, 90.0, 105.0, 95.0, 100.0,
        ]
    }

    #[test]
    fn short_series_returns_zero_sentinel() {
        assert_eq!(volatility(&[1.0, 2.0, 3.0]), VolatilityMetrics { cv: 0.0, bb_width: 0.0 });
        assert_eq!(volatility(&[]), VolatilityMetrics::default());
        assert_eq!(volatility(&[5.0; 19]), VolatilityMetrics::default());
    }

    #[test]
    fn constant_series_has_no_volatility_for_any_level() {
        for level in [0.000_123, 1.0, 42.42, 65_000.5] {
            let metrics = volatility(&vec![level; 25]);
            assert_eq!(metrics.cv, 0.0);
            assert_eq!(metrics.bb_width, 0.0);
        }
    }

    #[test]
    fn cv_is_sample_std_over_mean() {
        let prices = oscillating();
        let n = prices.len() as f64;
        let mean = prices.iter().sum::<f64>() / n;
        let var = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let expected = var.sqrt() / mean;

        let metrics = volatility(&prices);
        assert!((metrics.cv - expected).abs() < 1e-12);
    }

    #[test]
    fn bb_width_uses_trailing_twenty_points() {
        let prices = oscillating();
        let window = &prices[prices.len() - 20..];
        let sma = window.iter().sum::<f64>() / 20.0;
        let var = window.iter().map(|p| (p - sma).powi(2)).sum::<f64>() / 19.0;
        let expected = 4.0 * var.sqrt() / sma * 100.0;

        let metrics = volatility(&prices);
        assert!(metrics.bb_width > 0.0);
        assert!((metrics.bb_width - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_mean_guards_cv() {
        let mut prices = vec![-1.0; 10];
        prices.extend(vec![1.0; 10]);
        let metrics = volatility(&prices);
        assert_eq!(metrics.cv, 0.0);
        assert_eq!(metrics.bb_width, 0.0);
    }
}
