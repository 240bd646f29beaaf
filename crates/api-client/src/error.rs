use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to build or send the HTTP request: {0}")]
    RequestBuild(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Rate limit still exceeded at {0} after one retry")]
    RateLimited(String),

    #[error("IP address banned by the exchange (HTTP 418); stop sending requests")]
    IpBanned,

    #[error("Binance API error {0}: {1}")]
    BinanceError(i64, String),

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Deserialization(e.to_string())
    }
}
