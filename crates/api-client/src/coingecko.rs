use crate::error::ApiError;
use crate::responses::{MarketChart, SearchHit, SearchResponse, TokenData};
use crate::throttle::RequestThrottle;
use crate::MarketDataProvider;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// A concrete implementation of the `MarketDataProvider` for the CoinGecko API.
#[derive(Clone, Debug)]
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    throttle: RequestThrottle,
    rate_limit_backoff: Duration,
}

impl CoinGeckoClient {
    pub fn new(config: &configuration::CoinGecko) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("microanalyst/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            throttle: RequestThrottle::new(Duration::from_millis(config.min_interval_ms)),
            rate_limit_backoff: Duration::from_secs(config.rate_limit_backoff_secs),
        })
    }

    /// Paced GET returning the raw body. An HTTP 429 waits out the back-off and is
    /// retried once.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut retried = false;

        loop {
            self.throttle.acquire().await;

            let mut request = self.client.get(&url).query(query);
            if let Some(key) = &self.api_key {
                request = request.header(API_KEY_HEADER, key);
            }
            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if retried {
                    return Err(ApiError::RateLimited(url));
                }
                tracing::warn!(
                    backoff_secs = self.rate_limit_backoff.as_secs(),
                    "CoinGecko rate limit hit; backing off"
                );
                tokio::time::sleep(self.rate_limit_backoff).await;
                retried = true;
                continue;
            }

            let body = response.text().await?;
            if !status.is_success() {
                tracing::error!(status = status.as_u16(), url = %url, "CoinGecko request failed");
                return Err(ApiError::Http { status: status.as_u16(), url, body });
            }
            return Ok(body);
        }
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ApiError> {
        tracing::debug!(query, "Searching CoinGecko");
        let body = self.get("search", &[("query", query.to_string())]).await?;
        let response: SearchResponse = serde_json::from_str(&body)?;
        Ok(response.coins)
    }

    async fn token_data(&self, id: &str) -> Result<TokenData, ApiError> {
        let query = [
            ("localization", "false".to_string()),
            ("tickers", "false".to_string()),
            ("market_data", "true".to_string()),
            ("community_data", "false".to_string()),
            ("developer_data", "false".to_string()),
            ("sparkline", "false".to_string()),
        ];
        let body = self.get(&format!("coins/{id}"), &query).await?;
        TokenData::from_json(&body)
    }

    async fn market_chart(&self, id: &str, days: u32) -> Result<MarketChart, ApiError> {
        let query = [("vs_currency", "usd".to_string()), ("days", days.to_string())];
        let body = self.get(&format!("coins/{id}/market_chart"), &query).await?;
        MarketChart::from_json(&body)
    }
}
