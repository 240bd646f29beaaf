//! # Microanalyst Engine
//!
//! The orchestrator that turns a token query into a `TokenReport`: it resolves the
//! token, fetches history and the live order book through the provider traits, and
//! runs the analytics over them.
//!
//! Provider failures on the exchange side degrade the report (empty book, zero
//! exchange volume) instead of failing it; failures on the market-data side do not.
//!
//! Market-data responses go through a [`ResponseCache`]; exchange data is always live.

use crate::error::EngineError;
use analytics::{beta_proxy, volume_delta, AnalyticsEngine, EngineSettings, MacdParams};
use api_client::error::ApiError;
use api_client::{BinanceClient, CoinGeckoClient, ExchangeClient, MarketDataProvider, Ticker24h};
use configuration::Config;
use core_types::OrderBookSnapshot;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

pub mod cache;
pub mod compare;
pub mod error;
pub mod progress;
pub mod report;

pub use cache::ResponseCache;
pub use compare::{compare_reports, compare_set, ComparisonOutcome};
pub use progress::{AnalysisStep, NoProgress, ProgressObserver, StepUpdate};
pub use report::TokenReport;

/// Request-independent knobs of the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Quote asset appended to the token symbol to form the exchange pair.
    pub quote_asset: String,
    /// Order-book levels requested per side.
    pub depth_limit: u32,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            quote_asset: "USDT".to_string(),
            depth_limit: 100,
        }
    }
}

/// The central orchestrator for token analysis.
pub struct TokenAnalyzer<M, E> {
    market: M,
    exchange: E,
    engine: AnalyticsEngine,
    options: AnalyzerOptions,
    cache: ResponseCache,
}

impl TokenAnalyzer<CoinGeckoClient, BinanceClient> {
    /// Wires the live CoinGecko and Binance clients from configuration.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        configuration::validate(config).map_err(|e| EngineError::Configuration(e.to_string()))?;
        let market = CoinGeckoClient::new(&config.providers.coingecko)?;
        let exchange = BinanceClient::new(&config.providers.binance)?;
        let engine = AnalyticsEngine::new(EngineSettings {
            risk_free_rate: config.defaults.risk_free_rate,
            macd: MacdParams::default(),
            sort_order_book: config.analysis.sort_order_book,
        })?;
        let options = AnalyzerOptions {
            quote_asset: config.defaults.quote_asset.to_uppercase(),
            depth_limit: config.defaults.depth_limit,
        };
        let mut cache = ResponseCache::new(Duration::from_secs(config.cache.ttl_secs));
        if let Some(dir) = config.cache.resolved_dir() {
            tracing::debug!(dir = %dir.display(), ttl_secs = config.cache.ttl_secs, "Persisting cached responses");
            cache = cache.with_dir(dir);
        }
        Ok(Self::new(market, exchange, engine, options).with_cache(cache))
    }
}

impl<M, E> TokenAnalyzer<M, E>
where
    M: MarketDataProvider,
    E: ExchangeClient,
{
    /// Creates a new `TokenAnalyzer` from its provider clients and calculator.
    ///
    /// Responses are not cached until a cache is attached with [`Self::with_cache`].
    pub fn new(market: M, exchange: E, engine: AnalyticsEngine, options: AnalyzerOptions) -> Self {
        Self {
            market,
            exchange,
            engine,
            options,
            cache: ResponseCache::disabled(),
        }
    }

    /// Reuses search, token and chart responses through `cache`.
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Returns the cached response under `key`, or fetches and caches it.
    ///
    /// The flag is `true` when the value came from the cache.
    async fn cached<T, F>(&self, key: String, fetch: F) -> Result<(T, bool), EngineError>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T, ApiError>>,
    {
        if let Some(value) = self.cache.get::<T>(&key).await {
            tracing::debug!(%key, "Served from cache");
            return Ok((value, true));
        }
        let value = fetch.await?;
        self.cache.put(&key, &value).await;
        Ok((value, false))
    }

    /// Analyzes a single token.
    ///
    /// # Arguments
    ///
    /// * `query` - Symbol or name; the first search hit is used.
    /// * `days` - Look-back window for the price and volume history.
    /// * `reference_cv` - Volatility of a reference asset, enabling `beta_proxy`.
    /// * `progress` - Notified as each `AnalysisStep` starts and finishes.
    pub async fn analyze(
        &self,
        query: &str,
        days: u32,
        reference_cv: Option<f64>,
        progress: &dyn ProgressObserver,
    ) -> Result<TokenReport, EngineError> {
        // 1. Resolve
        progress.on_step(AnalysisStep::Search, StepUpdate::Started(&format!("Searching {query}...")));
        let search_key = format!("search:{}", query.trim().to_lowercase());
        let (hits, _) = self.cached(search_key, self.market.search(query)).await?;
        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::TokenNotFound(query.to_string()))?;
        let symbol = hit.symbol.to_uppercase();
        tracing::info!(query, id = %hit.id, symbol = %symbol, "Resolved token");
        progress.on_step(AnalysisStep::Search, StepUpdate::Finished);

        // 2. Market data
        progress.on_step(AnalysisStep::Market, StepUpdate::Started(&format!("Fetching data for {symbol}...")));
        let (token, token_cached) = self
            .cached(format!("token:{}", hit.id), self.market.token_data(&hit.id))
            .await?;
        let (chart, chart_cached) = self
            .cached(format!("chart:{}:{days}", hit.id), self.market.market_chart(&hit.id, days))
            .await?;
        progress.on_step(AnalysisStep::Market, StepUpdate::Finished);

        // 3. Exchange data
        let pair = format!("{symbol}{}", self.options.quote_asset);
        let mut message = format!("Fetching order book for {pair}...");
        if token_cached || chart_cached {
            message.push_str(" (cached)");
        }
        progress.on_step(AnalysisStep::OrderBook, StepUpdate::Started(&message));
        let (ticker, book) = self.fetch_exchange(&pair).await?;
        progress.on_step(AnalysisStep::OrderBook, StepUpdate::Finished);

        // 4. Analytics
        progress.on_step(AnalysisStep::Analysis, StepUpdate::Started(&format!("Analyzing {symbol}...")));
        let market_metrics = self.engine.analyze(&chart.prices, &chart.total_volumes, &book);
        let mut metrics = market_metrics.to_metric_result();

        let aggregated_volume = token.total_volume.unwrap_or(0.0);
        let exchange_volume = ticker.as_ref().map_or(0.0, |t| t.quote_volume);
        metrics.insert("vol_delta", volume_delta(aggregated_volume, exchange_volume));
        let beta = reference_cv.and_then(|r| beta_proxy(market_metrics.volatility.cv, r));
        metrics.insert("beta_proxy", beta);
        progress.on_step(AnalysisStep::Analysis, StepUpdate::Finished);

        tracing::info!(symbol = %symbol, points = chart.prices.len(), "Analysis complete");

        Ok(TokenReport {
            query: query.to_string(),
            id: hit.id,
            symbol,
            name: if token.name.is_empty() { hit.name } else { token.name },
            current_price: token.current_price,
            market_cap: token.market_cap,
            total_volume: token.total_volume,
            exchange_pair: pair,
            exchange_volume,
            metrics,
            prices: chart.prices,
            volumes: chart.total_volumes,
        })
    }

    /// Fetches the 24h ticker and the order book concurrently.
    ///
    /// A missing ticker means the pair is not listed, so the book is dropped as well.
    /// Only an IP ban is treated as fatal.
    async fn fetch_exchange(
        &self,
        pair: &str,
    ) -> Result<(Option<Ticker24h>, OrderBookSnapshot), EngineError> {
        let (ticker, depth) = tokio::join!(
            self.exchange.ticker_24h(pair),
            self.exchange.depth(pair, self.options.depth_limit)
        );

        match (ticker, depth) {
            (Err(ApiError::IpBanned), _) | (_, Err(ApiError::IpBanned)) => {
                Err(EngineError::ApiClient(ApiError::IpBanned))
            }
            (Ok(ticker), Ok(book)) => Ok((Some(ticker), book)),
            (Ok(ticker), Err(e)) => {
                tracing::warn!(pair, error = %e, "Order book unavailable; liquidity metrics will be zero");
                Ok((Some(ticker), OrderBookSnapshot::empty()))
            }
            (Err(e), _) => {
                tracing::warn!(pair, error = %e, "Exchange data unavailable; some metrics will be missing");
                Ok((None, OrderBookSnapshot::empty()))
            }
        }
    }

    /// Analyzes several tokens concurrently. Results keep the order of `queries`.
    pub async fn analyze_many(
        &self,
        queries: &[String],
        days: u32,
        reference_cv: Option<f64>,
        progress: &dyn ProgressObserver,
    ) -> Vec<Result<TokenReport, EngineError>> {
        let tasks = queries
            .iter()
            .map(|query| self.analyze(query, days, reference_cv, progress));
        join_all(tasks).await
    }

    /// The coefficient of variation of a reference asset, used as the `beta_proxy`
    /// denominator for other tokens.
    pub async fn reference_volatility(&self, reference: &str, days: u32) -> Result<f64, EngineError> {
        let report = self.analyze(reference, days, None, &NoProgress).await?;
        Ok(report.metric("cv").unwrap_or(0.0))
    }
}
