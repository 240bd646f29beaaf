use crate::error::CoreError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A single observation of a token's price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }

    /// Builds a point from a millisecond UNIX timestamp, as delivered by market-data APIs.
    pub fn from_millis(millis: i64, price: f64) -> Result<Self, CoreError> {
        let timestamp = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or(CoreError::InvalidTimestamp(millis))?;
        Ok(Self { timestamp, price })
    }
}

/// An ordered (ascending by time) series of prices.
///
/// Duplicated timestamps and irregular spacing are tolerated; nothing here re-sorts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceSeries(pub Vec<PricePoint>);

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self(points)
    }

    /// The price-only vector consumed by every formula that ignores timestamps.
    pub fn prices(&self) -> Vec<f64> {
        self.0.iter().map(|p| p.price).collect()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.0
    }

    pub fn latest(&self) -> Option<f64> {
        self.0.last().map(|p| p.price)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<PricePoint>> for PriceSeries {
    fn from(points: Vec<PricePoint>) -> Self {
        Self(points)
    }
}

/// A single observation of traded volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumePoint {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub volume: f64,
}

impl VolumePoint {
    pub fn from_millis(millis: i64, volume: f64) -> Result<Self, CoreError> {
        let timestamp = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or(CoreError::InvalidTimestamp(millis))?;
        Ok(Self { timestamp, volume })
    }
}

/// Volume observations aligned positionally with a `PriceSeries`.
///
/// Alignment is the caller's responsibility; timestamps need not match the price series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeSeries(pub Vec<VolumePoint>);

impl VolumeSeries {
    pub fn new(points: Vec<VolumePoint>) -> Self {
        Self(points)
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.0.iter().map(|v| v.volume).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One resting price level of an order book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub quantity: f64,
}

impl BookLevel {
    pub fn new(price: f64, quantity: f64) -> Self {
        Self { price, quantity }
    }

    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}

impl From<(f64, f64)> for BookLevel {
    fn from((price, quantity): (f64, f64)) -> Self {
        Self { price, quantity }
    }
}

/// A point-in-time order book.
///
/// Bids are expected in descending price order and asks in ascending price order.
/// Consumers rely on that ordering and do not re-sort; see [`OrderBookSnapshot::sorted`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBookSnapshot {
    pub fn new(bids: Vec<BookLevel>, asks: Vec<BookLevel>) -> Self {
        Self { bids, asks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() || self.asks.is_empty()
    }

    /// Returns a copy with bids sorted descending and asks ascending by price.
    ///
    /// NaN prices sort to the end of each side.
    pub fn sorted(&self) -> Self {
        let mut bids = self.bids.clone();
        let mut asks = self.asks.clone();
        bids.sort_by(|a, b| b.price.total_cmp(&a.price));
        asks.sort_by(|a, b| a.price.total_cmp(&b.price));
        // total_cmp orders positive NaN above everything, so move NaN bids to the back.
        bids.sort_by_key(|l| l.price.is_nan());
        Self { bids, asks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_series_exposes_price_vector_in_order() {
        let series = PriceSeries::new(vec![
            PricePoint::from_millis(1_640_000_000_000, 1.0).unwrap(),
            PricePoint::from_millis(1_640_086_400_000, 2.0).unwrap(),
        ]);
        assert_eq!(series.prices(), vec![1.0, 2.0]);
        assert_eq!(series.latest(), Some(2.0));
    }

    #[test]
    fn sorted_snapshot_orders_each_side_towards_the_midpoint() {
        let book = OrderBookSnapshot::new(
            vec![BookLevel::new(99.0, 1.0), BookLevel::new(100.0, 1.0), BookLevel::new(98.0, 1.0)],
            vec![BookLevel::new(102.0, 1.0), BookLevel::new(101.0, 1.0)],
        );
        let sorted = book.sorted();
        let bid_prices: Vec<f64> = sorted.bids.iter().map(|l| l.price).collect();
        let ask_prices: Vec<f64> = sorted.asks.iter().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![100.0, 99.0, 98.0]);
        assert_eq!(ask_prices, vec![101.0, 102.0]);
    }

    #[test]
    fn price_point_serializes_timestamp_as_millis() {
        let point = PricePoint::from_millis(1_640_000_000_000, 42.5).unwrap();
        let json = serde_json::to_value(point).unwrap();
        assert_eq!(json["timestamp"], 1_640_000_000_000_i64);
        assert_eq!(json["price"], 42.5);
    }
}
