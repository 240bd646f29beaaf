use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section is optional in the TOML file; omitted sections and keys fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub defaults: Defaults,
    pub providers: Providers,
    pub analysis: Analysis,
    pub comparison: Comparison,
    pub display: Display,
    pub logging: Logging,
    pub server: Server,
    pub cache: Cache,
}

/// Request defaults applied when the CLI or API caller does not override them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Defaults {
    /// Look-back window, in days, for price and volume history.
    pub days: u32,
    /// Asset whose volatility anchors the beta proxy (e.g. "btc").
    pub reference_symbol: String,
    /// Annualized risk-free rate for Sharpe and Sortino.
    pub risk_free_rate: f64,
    /// Quote asset appended to the symbol to form the exchange pair (e.g. "USDT").
    pub quote_asset: String,
    /// Number of order-book levels requested per side.
    pub depth_limit: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Providers {
    pub coingecko: CoinGecko,
    pub binance: Binance,
}

/// Market-data aggregator settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CoinGecko {
    pub base_url: String,
    /// Minimum spacing between two requests, in milliseconds.
    /// The public tier allows roughly 10 calls per minute.
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
    /// Back-off before the single retry after an HTTP 429.
    pub rate_limit_backoff_secs: u64,
    /// Demo/pro API key, sent as `x-cg-demo-api-key` when present.
    pub api_key: Option<String>,
}

/// Exchange settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Binance {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Wait used after an HTTP 429 that carries no `Retry-After` header.
    pub default_retry_after_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Analysis {
    /// Sort bids/asks before measuring depth instead of trusting provider order.
    pub sort_order_book: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Comparison {
    /// Metrics compared across tokens when none are requested explicitly.
    pub metrics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Display {
    /// Decimal places used when rendering metric tables.
    pub precision: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Server {
    pub addr: String,
}

/// Provider response cache.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Cache {
    /// How long a search, token or chart response is reused; 0 disables the cache.
    pub ttl_secs: u64,
    /// Keep responses on disk so they survive between runs.
    pub persist: bool,
    /// Where persisted responses live. Defaults to `~/.microanalyst/cache`.
    pub dir: Option<PathBuf>,
}

impl Cache {
    /// The directory responses are persisted to, if any.
    ///
    /// `None` when persistence is off, or when no directory is configured and the home
    /// directory is unknown.
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        if !self.persist {
            return None;
        }
        self.dir.clone().or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".microanalyst").join("cache"))
        })
    }
}

// --- Default Implementations ---
// These allow a user to run without any configuration file at all.

impl Default for Defaults {
    fn default() -> Self {
        Self {
            days: 30,
            reference_symbol: "btc".to_string(),
            risk_free_rate: 0.0,
            quote_asset: "USDT".to_string(),
            depth_limit: 100,
        }
    }
}

impl Default for CoinGecko {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            min_interval_ms: 6_000,
            timeout_secs: 10,
            rate_limit_backoff_secs: 60,
            api_key: None,
        }
    }
}

impl Default for Binance {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com/api/v3".to_string(),
            timeout_secs: 10,
            default_retry_after_secs: 60,
        }
    }
}

impl Default for Comparison {
    fn default() -> Self {
        Self {
            metrics: ["cv", "spread_pct", "vol_delta", "imbalance", "depth_2pct", "sharpe_ratio"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self { precision: 4 }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self { addr: "127.0.0.1:3000".to_string() }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            persist: true,
            dir: None,
        }
    }
}
