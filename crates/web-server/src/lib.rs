use api_client::{BinanceClient, CoinGeckoClient, ExchangeClient, MarketDataProvider};
use axum::{routing::get, Router};
use configuration::Config;
use engine::TokenAnalyzer;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
pub struct AppState<M, E> {
    pub analyzer: TokenAnalyzer<M, E>,
    pub default_days: u32,
    pub default_metrics: Vec<String>,
}

impl AppState<CoinGeckoClient, BinanceClient> {
    pub fn from_config(config: &Config) -> Result<Self, error::AppError> {
        Ok(Self {
            analyzer: TokenAnalyzer::<CoinGeckoClient, BinanceClient>::from_config(config)?,
            default_days: config.defaults.days,
            default_metrics: config.comparison.metrics.clone(),
        })
    }
}

/// Builds the application routes over any pair of providers.
pub fn router<M, E>(state: Arc<AppState<M, E>>) -> Router
where
    M: MarketDataProvider + 'static,
    E: ExchangeClient + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/analyze/:token", get(handlers::analyze_token::<M, E>))
        .route("/api/compare", get(handlers::compare_tokens::<M, E>))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// The main function to configure and run the web server.
///
/// Tracing is initialized by the caller.
pub async fn run_server(addr: SocketAddr, config: &Config) -> anyhow::Result<()> {
    let app_state = Arc::new(AppState::<CoinGeckoClient, BinanceClient>::from_config(config)?);
    let app = router(app_state);

    tracing::info!(%addr, "Web server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
