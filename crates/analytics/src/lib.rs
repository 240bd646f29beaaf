//! # Microanalyst Analytics Engine
//!
//! This crate derives market-health indicators for a single token from its price
//! history, volume history and an order-book snapshot.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of providers,
//!   caches or presentation. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** Every metric is a free function from input slices to a
//!   small result struct. Calling any of them twice with the same input yields
//!   bit-identical output.
//! - **Sentinels, not errors:** Short series, flat series and empty books resolve to
//!   documented zero/`None` values. `0.0` means "computed", `None` means "unavailable".
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: runs every module over one token's inputs.
//! - `MarketMetrics`: the typed bundle of all module outputs, flattenable into a
//!   `MetricResult`.
//! - The per-module functions (`volatility`, `technical_indicators`, `macd`,
//!   `fibonacci_levels`, `liquidity`, `volume_change`, `volume_delta`, `risk_metrics`).

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod liquidity;
pub mod report;
pub mod risk;
pub mod series;
pub mod trend;
pub mod volatility;
pub mod volume;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{AnalyticsEngine, EngineSettings};
pub use error::AnalyticsError;
pub use liquidity::{liquidity, LiquidityMetrics};
pub use report::MarketMetrics;
pub use risk::{risk_metrics, RiskMetrics};
pub use trend::{
    fibonacci_levels, macd, technical_indicators, FibonacciLevels, Macd, MacdParams,
    TechnicalIndicators,
};
pub use volatility::{volatility, VolatilityMetrics};
pub use volume::{beta_proxy, volume_change, volume_delta, VolumeMetrics};
