use crate::error::ApiError;
use crate::responses::{order_book_from_json, ApiErrorResponse, Ticker24h};
use crate::ExchangeClient;
use async_trait::async_trait;
use core_types::OrderBookSnapshot;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;

/// Binance answers 418 once an IP keeps ignoring 429s.
const IP_BANNED: u16 = 418;

/// A concrete implementation of the `ExchangeClient` for the Binance public REST API.
#[derive(Clone, Debug)]
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
    default_retry_after: Duration,
}

impl BinanceClient {
    pub fn new(config: &configuration::Binance) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_retry_after: Duration::from_secs(config.default_retry_after_secs),
        })
    }

    /// GET returning the raw body. An HTTP 429 waits for `Retry-After` and is retried
    /// once; an HTTP 418 aborts immediately.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut retried = false;

        loop {
            let response = self.client.get(&url).query(query).send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if retried {
                    return Err(ApiError::RateLimited(url));
                }
                let wait = retry_after(response.headers(), self.default_retry_after);
                tracing::warn!(wait_secs = wait.as_secs(), "Binance rate limit hit; waiting");
                tokio::time::sleep(wait).await;
                retried = true;
                continue;
            }
            if status.as_u16() == IP_BANNED {
                tracing::error!("Binance IP ban received; stop sending requests");
                return Err(ApiError::IpBanned);
            }

            let body = response.text().await?;
            if !status.is_success() {
                return Err(match serde_json::from_str::<ApiErrorResponse>(&body) {
                    Ok(api_error) => ApiError::BinanceError(api_error.code, api_error.msg),
                    Err(_) => ApiError::Http { status: status.as_u16(), url, body },
                });
            }
            return Ok(body);
        }
    }
}

/// Seconds from a `Retry-After` header, or `default` when it is absent or not a number.
pub(crate) fn retry_after(headers: &HeaderMap, default: Duration) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn ticker_24h(&self, symbol: &str) -> Result<Ticker24h, ApiError> {
        let body = self.get("ticker/24hr", &[("symbol", symbol.to_uppercase())]).await?;
        Ticker24h::from_json(&body)
    }

    async fn depth(&self, symbol: &str, limit: u32) -> Result<OrderBookSnapshot, ApiError> {
        let query = [("symbol", symbol.to_uppercase()), ("limit", limit.to_string())];
        let body = self.get("depth", &query).await?;
        order_book_from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn retry_after_header_overrides_default() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("17"));
        assert_eq!(retry_after(&headers, Duration::from_secs(60)), Duration::from_secs(17));
    }

    #[test]
    fn missing_or_malformed_retry_after_uses_default() {
        let default = Duration::from_secs(60);
        assert_eq!(retry_after(&HeaderMap::new(), default), default);

        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers, default), default);
    }

    #[test]
    fn client_builds_from_default_config() {
        let client = BinanceClient::new(&configuration::Binance::default()).unwrap();
        assert_eq!(client.base_url, "https://api.binance.com/api/v3");
        assert_eq!(client.default_retry_after, Duration::from_secs(60));
    }
}
