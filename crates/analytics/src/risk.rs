use crate::series;
use core_types::MetricResult;
use serde::{Deserialize, Serialize};

/// Crypto markets trade every day of the year.
pub const PERIODS_PER_YEAR: f64 = 365.0;

/// Drawdown and risk-adjusted return of a price series.
///
/// All three are `None` when fewer than two prices are available, and `Some(0.0)`
/// when the series has no return volatility at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Largest peak-to-trough decline as a fraction (≤ 0; 0 means no drawdown).
    pub max_drawdown: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    /// May be `+∞` when returns are positive and there is no downside deviation.
    pub sortino_ratio: Option<f64>,
}

impl RiskMetrics {
    fn flat() -> Self {
        Self {
            max_drawdown: Some(0.0),
            sharpe_ratio: Some(0.0),
            sortino_ratio: Some(0.0),
        }
    }

    pub fn to_metric_result(&self) -> MetricResult {
        let mut out = MetricResult::new();
        out.insert("max_drawdown", self.max_drawdown);
        out.insert("sharpe_ratio", self.sharpe_ratio);
        out.insert("sortino_ratio", self.sortino_ratio);
        out
    }
}

/// Computes max drawdown and annualized Sharpe/Sortino ratios.
///
/// # Arguments
///
/// * `prices` - Historical prices ordered by time.
/// * `risk_free_rate` - Annualized risk-free rate, de-annualized over 365 periods.
pub fn risk_metrics(prices: &[f64], risk_free_rate: f64) -> RiskMetrics {
    if prices.len() < 2 {
        return RiskMetrics::default();
    }

    let returns = series::pct_change(prices);
    let returns_std = series::sample_std(&returns);
    if returns.is_empty() || returns_std == Some(0.0) {
        tracing::trace!("risk metrics: no return volatility");
        return RiskMetrics::flat();
    }

    let max_drawdown = max_drawdown(prices);
    let annual_factor = PERIODS_PER_YEAR.sqrt();

    let period_rf = risk_free_rate / PERIODS_PER_YEAR;
    let excess: Vec<f64> = returns.iter().map(|r| r - period_rf).collect();
    let mean_excess = series::mean(&excess).unwrap_or(0.0);
    let mean_return = series::mean(&returns).unwrap_or(0.0);

    // A single return has no sample deviation; the ratio is then unavailable.
    let sharpe_ratio = returns_std.map(|std| mean_excess / std * annual_factor);

    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let sortino_ratio = if downside.is_empty() {
        Some(no_downside_sortino(mean_return))
    } else {
        match series::sample_std(&downside) {
            Some(std) if std == 0.0 => Some(no_downside_sortino(mean_return)),
            Some(std) => Some(mean_excess / std * annual_factor),
            None => None,
        }
    };

    RiskMetrics {
        max_drawdown: Some(max_drawdown),
        sharpe_ratio,
        sortino_ratio,
    }
}

fn no_downside_sortino(mean_return: f64) -> f64 {
    if mean_return > 0.0 { f64::INFINITY } else { 0.0 }
}

/// Minimum of `(price - running_max) / running_max` over the series.
fn max_drawdown(prices: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &price in prices {
        peak = peak.max(price);
        if peak != 0.0 {
            worst = worst.min((price - peak) / peak);
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crash_and_partial_recovery() {
        let metrics = risk_metrics(&[100.0, 50.0, 60.0], 0.0);
        assert_eq!(metrics.max_drawdown, Some(-0.5));
        assert!(metrics.sharpe_ratio.unwrap() < 0.0);
        // A single negative return has no sample deviation.
        assert_eq!(metrics.sortino_ratio, None);
    }

    #[test]
    fn steady_gains_have_infinite_sortino() {
        let metrics = risk_metrics(&[100.0, 110.0, 115.0], 0.0);
        assert_eq!(metrics.max_drawdown, Some(0.0));
        assert!(metrics.sharpe_ratio.unwrap() > 0.0);
        assert_eq!(metrics.sortino_ratio, Some(f64::INFINITY));
    }

    #[test]
    fn insufficient_data_is_unavailable_not_zero() {
        assert_eq!(risk_metrics(&[], 0.0), RiskMetrics::default());
        assert_eq!(risk_metrics(&[100.0], 0.0).sharpe_ratio, None);
    }

    #[test]
    fn flat_prices_are_zero_not_unavailable() {
        let metrics = risk_metrics(&[100.0; 10], 0.0);
        assert_eq!(metrics, RiskMetrics::flat());
    }

    #[test]
    fn sharpe_matches_closed_form() {
        let prices = [100.0, 102.0, 99.0, 105.0, 103.0, 108.0];
        let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let std = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
        let expected = mean / std * 365.0_f64.sqrt();

        let metrics = risk_metrics(&prices, 0.0);
        assert!((metrics.sharpe_ratio.unwrap() - expected).abs() < 1e-9);
        assert!(metrics.sortino_ratio.unwrap().is_finite());
        assert!(metrics.max_drawdown.unwrap() < 0.0);
    }

    #[test]
    fn risk_free_rate_lowers_sharpe() {
        let prices = [100.0, 102.0, 99.0, 105.0, 103.0, 108.0];
        let base = risk_metrics(&prices, 0.0).sharpe_ratio.unwrap();
        let with_rf = risk_metrics(&prices, 0.05).sharpe_ratio.unwrap();
        assert!(with_rf < base);
    }

    #[test]
    fn identical_losses_with_negative_mean_give_zero_sortino() {
        // Two identical -10% moves: downside std is exactly zero, mean return negative.
        let metrics = risk_metrics(&[100.0, 90.0, 81.0, 85.0], 0.0);
        assert_eq!(metrics.sortino_ratio, Some(0.0));
    }
}
