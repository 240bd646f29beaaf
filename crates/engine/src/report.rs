use core_types::{MetricResult, PriceSeries, VolumeSeries};
use serde::{Deserialize, Serialize};

/// Everything known about one analysed token.
///
/// This struct is the final output of the `TokenAnalyzer` and the unit that the CLI
/// renders, the HTTP API returns and the comparator consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenReport {
    /// The text the caller asked for, before resolution.
    pub query: String,
    /// Provider identifier, e.g. `bitcoin`.
    pub id: String,
    /// Upper-cased ticker symbol, e.g. `BTC`.
    pub symbol: String,
    pub name: String,

    // I. Market snapshot
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>, // aggregated across venues
    pub exchange_pair: String,
    pub exchange_volume: f64, // 0 when the exchange does not list the pair

    // II. Derived indicators
    pub metrics: MetricResult,

    // III. History the indicators were computed from
    pub prices: PriceSeries,
    pub volumes: VolumeSeries,
}

impl TokenReport {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.number(name)
    }
}
