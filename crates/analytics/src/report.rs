use crate::liquidity::LiquidityMetrics;
use crate::risk::RiskMetrics;
use crate::trend::{FibonacciLevels, Macd, TechnicalIndicators};
use crate::volatility::VolatilityMetrics;
use crate::volume::VolumeMetrics;
use core_types::MetricResult;
use serde::{Deserialize, Serialize};

/// The complete set of single-token indicators.
///
/// This struct is the output of the `AnalyticsEngine`. Each group keeps its typed
/// form for callers that need it; [`MarketMetrics::to_metric_result`] flattens all of
/// them into the name-keyed dictionary used for display, export and comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketMetrics {
    // I. Price dispersion
    pub volatility: VolatilityMetrics,

    // II. Trend
    pub technical: TechnicalIndicators,
    pub macd: Macd,
    pub fibonacci: Option<FibonacciLevels>, // None for an empty price series

    // III. Order book and volume
    pub liquidity: LiquidityMetrics,
    pub volume: VolumeMetrics,

    // IV. Risk-adjusted return
    pub risk: RiskMetrics,
}

impl MarketMetrics {
    /// Flattens every group into one ordered `MetricResult`.
    ///
    /// Key order is stable: volatility, technical, MACD, liquidity, volume, risk, then
    /// the Fibonacci levels when present.
    pub fn to_metric_result(&self) -> MetricResult {
        let mut out = self.volatility.to_metric_result();
        out.extend(self.technical.to_metric_result());
        out.extend(self.macd.to_metric_result());
        out.extend(self.liquidity.to_metric_result());
        out.extend(self.volume.to_metric_result());
        out.extend(self.risk.to_metric_result());
        if let Some(fib) = &self.fibonacci {
            out.extend(fib.to_metric_result());
        }
        out
    }
}
