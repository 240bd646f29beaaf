use crate::error::ApiError;
use core_types::{BookLevel, OrderBookSnapshot, PricePoint, PriceSeries, VolumePoint, VolumeSeries};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ==============================================================================
// CoinGecko
// ==============================================================================

/// One match from `GET /search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
}

/// The response from `GET /search`; only the coin matches are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub coins: Vec<SearchHit>,
}

/// Token details from `GET /coins/{id}`, reduced to the USD market figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenData {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    /// Aggregated 24h volume across all venues.
    pub total_volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCoin {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    market_data: Option<RawMarketData>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMarketData {
    #[serde(default)]
    current_price: UsdValue,
    #[serde(default)]
    market_cap: UsdValue,
    #[serde(default)]
    total_volume: UsdValue,
}

#[derive(Debug, Default, Deserialize)]
struct UsdValue {
    usd: Option<f64>,
}

impl TokenData {
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        let raw: RawCoin = serde_json::from_str(body)?;
        let market = raw.market_data.unwrap_or_default();
        Ok(Self {
            id: raw.id,
            symbol: raw.symbol,
            name: raw.name,
            current_price: market.current_price.usd,
            market_cap: market.market_cap.usd,
            total_volume: market.total_volume.usd,
        })
    }
}

/// Price and volume history from `GET /coins/{id}/market_chart`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketChart {
    pub prices: PriceSeries,
    pub total_volumes: VolumeSeries,
}

// Timestamps arrive as JSON numbers that are not always integral.
#[derive(Debug, Deserialize)]
struct RawMarketChart {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
    #[serde(default)]
    total_volumes: Vec<(f64, f64)>,
}

impl MarketChart {
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        let raw: RawMarketChart = serde_json::from_str(body)?;

        let prices = raw
            .prices
            .into_iter()
            .map(|(ts, price)| PricePoint::from_millis(ts as i64, price))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::InvalidData(e.to_string()))?;

        let total_volumes = raw
            .total_volumes
            .into_iter()
            .map(|(ts, volume)| VolumePoint::from_millis(ts as i64, volume))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::InvalidData(e.to_string()))?;

        Ok(Self {
            prices: PriceSeries::new(prices),
            total_volumes: VolumeSeries::new(total_volumes),
        })
    }
}

// ==============================================================================
// Binance
// ==============================================================================

/// 24h rolling statistics from `GET /ticker/24hr`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticker24h {
    pub symbol: String,
    pub last_price: f64,
    pub price_change_percent: f64,
    /// Base-asset volume.
    pub volume: f64,
    /// Quote-asset volume, comparable to the aggregator's USD volume.
    pub quote_volume: f64,
}

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTicker24h {
    symbol: String,
    last_price: String,
    price_change_percent: String,
    volume: String,
    quote_volume: String,
}

impl Ticker24h {
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        let raw: RawTicker24h = serde_json::from_str(body)?;
        Ok(Self {
            symbol: raw.symbol,
            last_price: parse_decimal(&raw.last_price)?,
            price_change_percent: parse_decimal(&raw.price_change_percent)?,
            volume: parse_decimal(&raw.volume)?,
            quote_volume: parse_decimal(&raw.quote_volume)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDepth {
    #[serde(default)]
    bids: Vec<(String, String)>,
    #[serde(default)]
    asks: Vec<(String, String)>,
}

/// Parses `GET /depth` into a snapshot, keeping the exchange's level order.
pub fn order_book_from_json(body: &str) -> Result<OrderBookSnapshot, ApiError> {
    let raw: RawDepth = serde_json::from_str(body)?;
    Ok(OrderBookSnapshot::new(parse_levels(&raw.bids)?, parse_levels(&raw.asks)?))
}

fn parse_levels(levels: &[(String, String)]) -> Result<Vec<BookLevel>, ApiError> {
    levels
        .iter()
        .map(|(price, qty)| Ok(BookLevel::new(parse_decimal(price)?, parse_decimal(qty)?)))
        .collect()
}

fn parse_decimal(raw: &str) -> Result<f64, ApiError> {
    Decimal::from_str(raw)
        .map_err(|e| ApiError::Deserialization(format!("{raw:?}: {e}")))?
        .to_f64()
        .ok_or_else(|| ApiError::InvalidData(format!("{raw} does not fit in f64")))
}

/// Represents an error response from the Binance API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i64,
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_search_hits_in_rank_order() {
        let body = json!({
            "coins": [
                {"id": "solana", "symbol": "SOL", "name": "Solana", "market_cap_rank": 5},
                {"id": "solana-wormhole", "symbol": "SOL", "name": "Wrapped SOL", "market_cap_rank": null}
            ],
            "exchanges": []
        })
        .to_string();
        let response: SearchResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(response.coins.len(), 2);
        assert_eq!(response.coins[0].id, "solana");
        assert_eq!(response.coins[1].market_cap_rank, None);
    }

    #[test]
    fn token_data_keeps_usd_figures_only() {
        let body = json!({
            "id": "bitcoin", "symbol": "btc", "name": "Bitcoin",
            "market_data": {
                "current_price": {"usd": 65000.5, "eur": 60000.0},
                "market_cap": {"usd": 1.2e12},
                "total_volume": {"usd": 3.5e10}
            }
        })
        .to_string();
        let data = TokenData::from_json(&body).unwrap();
        assert_eq!(data.current_price, Some(65000.5));
        assert_eq!(data.market_cap, Some(1.2e12));
        assert_eq!(data.total_volume, Some(3.5e10));
    }

    #[test]
    fn token_data_without_market_data_is_empty_not_an_error() {
        let body = json!({"id": "x", "symbol": "x", "name": "X"}).to_string();
        let data = TokenData::from_json(&body).unwrap();
        assert_eq!(data.current_price, None);
        assert_eq!(data.total_volume, None);
    }

    #[test]
    fn market_chart_builds_series() {
        let body = json!({
            "prices": [[1640000000000.0, 48000.0], [1640086400000u64, 49000.0]],
            "total_volumes": [[1640000000000u64, 1.0e9], [1640086400000u64, 1.1e9]],
            "market_caps": []
        })
        .to_string();
        let chart = MarketChart::from_json(&body).unwrap();
        assert_eq!(chart.prices.prices(), vec![48000.0, 49000.0]);
        assert_eq!(chart.total_volumes.volumes(), vec![1.0e9, 1.1e9]);
        assert_eq!(chart.prices.points()[0].timestamp.timestamp_millis(), 1_640_000_000_000);
    }

    #[test]
    fn ticker_parses_decimal_strings() {
        let body = json!({
            "symbol": "BTCUSDT", "lastPrice": "65000.10000000", "priceChangePercent": "-1.250",
            "volume": "12345.678", "quoteVolume": "802469070.12", "count": 100
        })
        .to_string();
        let ticker = Ticker24h::from_json(&body).unwrap();
        assert!((ticker.last_price - 65000.1).abs() < 1e-9);
        assert_eq!(ticker.price_change_percent, -1.25);
        assert!((ticker.quote_volume - 802469070.12).abs() < 1e-6);
    }

    #[test]
    fn depth_parses_levels_in_exchange_order() {
        let body = json!({
            "lastUpdateId": 1027024,
            "bids": [["100.00", "2.0"], ["99.50", "3.0"]],
            "asks": [["101.00", "1.0"], ["101.50", "1.5"]]
        })
        .to_string();
        let book = order_book_from_json(&body).unwrap();
        assert_eq!(book.bids, vec![BookLevel::new(100.0, 2.0), BookLevel::new(99.5, 3.0)]);
        assert_eq!(book.best_ask(), Some(&BookLevel::new(101.0, 1.0)));
    }

    #[test]
    fn malformed_decimal_is_a_deserialization_error() {
        let body = json!({"bids": [["abc", "1"]], "asks": []}).to_string();
        assert!(matches!(order_book_from_json(&body), Err(ApiError::Deserialization(_))));
    }
}
