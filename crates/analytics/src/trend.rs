use crate::error::AnalyticsError;
use crate::series;
use core_types::{MetricResult, Trend};
use serde::{Deserialize, Serialize};

/// Minimum series length for RSI/SMA analysis (driven by the SMA-50).
pub const TECHNICAL_MIN_POINTS: usize = 50;
pub const RSI_PERIOD: usize = 14;
pub const SMA_SHORT: usize = 20;
pub const SMA_LONG: usize = 50;

/// Retracement ratios, paired with the metric key they are reported under.
pub const FIBONACCI_RATIOS: [(f64, &str); 5] = [
    (0.236, "fib_0.236"),
    (0.382, "fib_0.382"),
    (0.5, "fib_0.500"),
    (0.618, "fib_0.618"),
    (0.786, "fib_0.786"),
];

/// RSI, moving averages and the trend label derived from them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub rsi: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub trend: Trend,
}

impl TechnicalIndicators {
    pub fn to_metric_result(&self) -> MetricResult {
        let mut out = MetricResult::new();
        out.insert("rsi", self.rsi);
        out.insert("sma_20", self.sma_20);
        out.insert("sma_50", self.sma_50);
        out.insert("trend", self.trend);
        out
    }
}

/// Computes RSI-14, SMA-20, SMA-50 and the trend label.
///
/// RSI uses simple rolling means of gains and losses over the last 14 price changes,
/// not Wilder smoothing. Fewer than 50 prices yields all `None` and `NEUTRAL`.
pub fn technical_indicators(prices: &[f64]) -> TechnicalIndicators {
    if prices.len() < TECHNICAL_MIN_POINTS {
        tracing::trace!(points = prices.len(), "technical indicators: not enough data");
        return TechnicalIndicators::default();
    }

    let rsi = simple_rsi(prices, RSI_PERIOD);
    let sma_20 = series::trailing_mean(prices, SMA_SHORT);
    let sma_50 = series::trailing_mean(prices, SMA_LONG);

    let trend = match (prices.last(), sma_20, sma_50) {
        (Some(&price), Some(short), Some(long)) => classify_trend(price, short, long),
        _ => Trend::Neutral,
    };

    TechnicalIndicators { rsi, sma_20, sma_50, trend }
}

/// RSI over the trailing `period` price changes using simple averages.
///
/// A pure uptrend (no losses) gives 100, a pure downtrend gives 0, and a window with
/// neither gains nor losses has no defined RSI.
fn simple_rsi(prices: &[f64], period: usize) -> Option<f64> {
    let deltas = series::diff(prices);
    let window = series::tail(&deltas, period)?;

    let avg_gain = window.iter().map(|d| d.max(0.0)).sum::<f64>() / period as f64;
    let avg_loss = window.iter().map(|d| (-d).max(0.0)).sum::<f64>() / period as f64;

    // avg_loss == 0 makes rs infinite, which drives the formula to exactly 100.
    let rs = avg_gain / avg_loss;
    let rsi = 100.0 - 100.0 / (1.0 + rs);
    if rsi.is_nan() { None } else { Some(rsi) }
}

fn classify_trend(price: f64, sma_20: f64, sma_50: f64) -> Trend {
    if price > sma_20 && sma_20 > sma_50 {
        Trend::Bullish
    } else if price < sma_20 && sma_20 < sma_50 {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

/// Spans of the three exponential moving averages behind MACD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl MacdParams {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, AnalyticsError> {
        if fast == 0 || slow == 0 || signal == 0 {
            return Err(AnalyticsError::InvalidParameters(
                "MACD spans cannot be zero".to_string(),
            ));
        }
        if fast >= slow {
            return Err(AnalyticsError::InvalidParameters(format!(
                "MACD fast span ({fast}) must be shorter than slow span ({slow})"
            )));
        }
        Ok(Self { fast, slow, signal })
    }
}

impl Default for MacdParams {
    fn default() -> Self {
        Self { fast: 12, slow: 26, signal: 9 }
    }
}

/// Latest values of the MACD line, its signal line and the histogram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub macd_line: Option<f64>,
    pub signal_line: Option<f64>,
    pub histogram: Option<f64>,
}

impl Macd {
    pub fn to_metric_result(&self) -> MetricResult {
        let mut out = MetricResult::new();
        out.insert("macd_line", self.macd_line);
        out.insert("signal_line", self.signal_line);
        out.insert("histogram", self.histogram);
        out
    }
}

/// Moving Average Convergence Divergence.
///
/// Requires at least `params.slow` prices; otherwise every field is `None`.
pub fn macd(prices: &[f64], params: MacdParams) -> Macd {
    if prices.is_empty() || prices.len() < params.slow {
        return Macd::default();
    }

    let ema_fast = series::ema(prices, params.fast);
    let ema_slow = series::ema(prices, params.slow);
    let macd_line: Vec<f64> = ema_fast.iter().zip(&ema_slow).map(|(f, s)| f - s).collect();
    let signal_line = series::ema(&macd_line, params.signal);

    match (macd_line.last(), signal_line.last()) {
        (Some(&line), Some(&signal)) => Macd {
            macd_line: Some(line),
            signal_line: Some(signal),
            histogram: Some(line - signal),
        },
        _ => Macd::default(),
    }
}

/// Retracement levels between the period high and low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevels {
    pub high: f64,
    pub low: f64,
    /// `(ratio, level)` pairs in ascending ratio order.
    pub levels: Vec<(f64, f64)>,
}

impl FibonacciLevels {
    /// Level for a given ratio, if it is one of the standard ratios.
    pub fn level(&self, ratio: f64) -> Option<f64> {
        self.levels.iter().find(|(r, _)| *r == ratio).map(|(_, l)| *l)
    }

    pub fn to_metric_result(&self) -> MetricResult {
        let mut out = MetricResult::new();
        for ((_, key), (_, level)) in FIBONACCI_RATIOS.iter().zip(&self.levels) {
            out.insert(*key, *level);
        }
        out.insert("high", self.high);
        out.insert("low", self.low);
        out
    }
}

/// Fibonacci retracement levels, `high - (high - low) * ratio`.
///
/// Empty input has no levels.
pub fn fibonacci_levels(prices: &[f64]) -> Option<FibonacciLevels> {
    if prices.is_empty() {
        return None;
    }
    let high = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let low = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let diff = high - low;

    let levels = FIBONACCI_RATIOS
        .iter()
        .map(|(ratio, _)| (*ratio, high - (diff * ratio)))
        .collect();

    Some(FibonacciLevels { high, low, levels })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uptrend() -> Vec<f64> {
        (1..=100).map(f64::from).collect()
    }

    #[test]
    fn monotonic_uptrend_is_bullish_with_rsi_100() {
        let ta = technical_indicators(&uptrend());
        assert_eq!(ta.rsi, Some(100.0));
        assert_eq!(ta.sma_20, Some(90.5));
        assert_eq!(ta.sma_50, Some(75.5));
        assert_eq!(ta.trend, Trend::Bullish);
    }

    #[test]
    fn monotonic_downtrend_is_bearish_with_rsi_0() {
        let prices: Vec<f64> = (1..=100).rev().map(f64::from).collect();
        let ta = technical_indicators(&prices);
        assert_eq!(ta.rsi, Some(0.0));
        assert_eq!(ta.trend, Trend::Bearish);
    }

    #[test]
    fn short_series_has_no_indicators() {
        let ta = technical_indicators(&[1.0; 49]);
        assert_eq!(ta, TechnicalIndicators::default());
        assert_eq!(ta.trend, Trend::Neutral);
        assert!(ta.to_metric_result().get("rsi").unwrap().is_null());
    }

    #[test]
    fn flat_series_has_undefined_rsi_and_neutral_trend() {
        let ta = technical_indicators(&[10.0; 60]);
        assert_eq!(ta.rsi, None);
        assert_eq!(ta.sma_20, Some(10.0));
        assert_eq!(ta.trend, Trend::Neutral);
    }

    #[test]
    fn rsi_uses_simple_averages_of_last_fourteen_changes() {
        // 36 flat points, then alternating +2 / -1 moves for 14 changes.
        let mut prices = vec![100.0; 36];
        let mut last = 100.0;
        for i in 0..14 {
            last += if i % 2 == 0 { 2.0 } else { -1.0 };
            prices.push(last);
        }
        let ta = technical_indicators(&prices);
        // avg_gain = 14/14 = 1.0, avg_loss = 7/14 = 0.5, rs = 2
        let expected = 100.0 - 100.0 / 3.0;
        assert!((ta.rsi.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn macd_needs_slow_span_of_data() {
        assert_eq!(macd(&[100.0, 101.0, 102.0], MacdParams::default()), Macd::default());
        assert_eq!(macd(&[], MacdParams::default()), Macd::default());
    }

    #[test]
    fn macd_on_rising_prices_is_positive_and_consistent() {
        let prices: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let out = macd(&prices, MacdParams::default());
        let line = out.macd_line.unwrap();
        let signal = out.signal_line.unwrap();
        assert!(line > 0.0);
        assert_eq!(out.histogram, Some(line - signal));
    }

    #[test]
    fn macd_on_constant_prices_is_zero() {
        let out = macd(&[50.0; 30], MacdParams::default());
        assert!(out.macd_line.unwrap().abs() < 1e-9);
        assert!(out.signal_line.unwrap().abs() < 1e-9);
        assert!(out.histogram.unwrap().abs() < 1e-9);
    }

    #[test]
    fn macd_params_are_validated() {
        assert!(MacdParams::new(12, 26, 9).is_ok());
        assert!(MacdParams::new(26, 12, 9).is_err());
        assert!(MacdParams::new(0, 26, 9).is_err());
    }

    #[test]
    fn fibonacci_levels_for_simple_range() {
        let levels = fibonacci_levels(&[100.0, 200.0]).unwrap();
        assert_eq!(levels.high, 200.0);
        assert_eq!(levels.low, 100.0);
        assert_eq!(levels.level(0.5), Some(150.0));
        assert_eq!(levels.level(0.618), Some(138.2));
        assert_eq!(levels.level(0.236), Some(176.4));

        let flat = levels.to_metric_result();
        assert_eq!(flat.number("fib_0.500"), Some(150.0));
        assert_eq!(flat.number("fib_0.618"), Some(138.2));
        assert_eq!(flat.number("high"), Some(200.0));
        assert_eq!(flat.len(), 7);
    }

    #[test]
    fn fibonacci_of_empty_input_is_empty() {
        assert!(fibonacci_levels(&[]).is_none());
    }
}
