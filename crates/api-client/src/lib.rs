use crate::error::ApiError;
use async_trait::async_trait;
use core_types::OrderBookSnapshot;

pub mod binance;
pub mod coingecko;
pub mod error;
pub mod responses;
pub mod throttle;

// --- Public API ---
pub use binance::BinanceClient;
pub use coingecko::CoinGeckoClient;
pub use responses::{MarketChart, SearchHit, Ticker24h, TokenData};
pub use throttle::RequestThrottle;

/// The abstract interface for a market-data aggregator.
/// The orchestrator depends only on this trait, so a fake can stand in for the live
/// service in tests.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Resolves a free-text query (symbol or name) to candidate tokens, best match first.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ApiError>;

    /// Fetches current price, market cap and aggregated 24h volume.
    async fn token_data(&self, id: &str) -> Result<TokenData, ApiError>;

    /// Fetches price and volume history for the last `days` days.
    async fn market_chart(&self, id: &str, days: u32) -> Result<MarketChart, ApiError>;
}

/// The abstract interface for an exchange's public market endpoints.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fetches 24h rolling statistics for a trading pair such as `BTCUSDT`.
    async fn ticker_24h(&self, symbol: &str) -> Result<Ticker24h, ApiError>;

    /// Fetches the top `limit` levels of each side of the order book.
    async fn depth(&self, symbol: &str, limit: u32) -> Result<OrderBookSnapshot, ApiError>;
}
