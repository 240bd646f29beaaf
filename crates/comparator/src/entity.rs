use crate::error::ComparatorError;
use core_types::PriceSeries;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One token taking part in a comparison.
///
/// Metric values are kept raw; they are coerced to numbers only when a comparison
/// runs, so a malformed cell becomes a missing value rather than a failed parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntity {
    pub symbol: String,
    #[serde(default)]
    pub metrics: IndexMap<String, Value>,
    #[serde(default)]
    pub prices: PriceSeries,
}

impl ComparisonEntity {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metrics.insert(name.into(), value.into());
        self
    }

    pub fn with_prices(mut self, prices: PriceSeries) -> Self {
        self.prices = prices;
        self
    }

    /// The metric coerced to a finite `f64`, or `None` when it is missing or not numeric.
    pub fn numeric(&self, metric: &str) -> Option<f64> {
        self.metrics.get(metric).and_then(coerce_numeric)
    }
}

/// Coerces a raw metric cell to a number.
///
/// JSON numbers and numeric strings are accepted. Booleans, nulls, containers and
/// non-finite results are treated as missing.
pub fn coerce_numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// The ordered group of entities being compared.
///
/// Insertion order is preserved and duplicate symbols are allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComparisonSet(Vec<ComparisonEntity>);

impl ComparisonSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: ComparisonEntity) {
        self.0.push(entity);
    }

    pub fn entities(&self) -> &[ComparisonEntity] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComparisonEntity> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a set from JSON.
    ///
    /// Accepts either an array of entities or an object holding them under `reports`,
    /// which is the shape of an exported comparison. Exported token reports carry their
    /// market figures (`market_cap`, `exchange_volume`, ...) beside `metrics` rather
    /// than inside it; top-level numeric fields are folded into the metrics so they stay
    /// comparable. Other unknown fields are ignored.
    pub fn from_json_str(input: &str) -> Result<Self, ComparatorError> {
        let value: Value = serde_json::from_str(input)?;
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("reports") {
                Some(Value::Array(items)) => items,
                _ => return Err(ComparatorError::UnexpectedShape),
            },
            _ => return Err(ComparatorError::UnexpectedShape),
        };

        let mut set = Self::new();
        for (position, mut item) in items.into_iter().enumerate() {
            fold_top_level_numbers(&mut item);
            let entity: ComparisonEntity = serde_json::from_value(item)?;
            if entity.symbol.trim().is_empty() {
                return Err(ComparatorError::MissingSymbol(position));
            }
            set.push(entity);
        }
        Ok(set)
    }
}

/// Moves numeric top-level fields of an entity object into its `metrics` map.
///
/// A metric already present under the same name wins.
fn fold_top_level_numbers(item: &mut Value) {
    let Value::Object(map) = item else {
        return;
    };
    let figures: Vec<(String, Value)> = map
        .iter()
        .filter(|(key, value)| {
            !matches!(key.as_str(), "symbol" | "metrics" | "prices") && value.is_number()
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if figures.is_empty() {
        return;
    }

    let metrics = map
        .entry("metrics")
        .or_insert_with(|| Value::Object(Default::default()));
    if metrics.is_null() {
        *metrics = Value::Object(Default::default());
    }
    if let Value::Object(metrics) = metrics {
        for (key, value) in figures {
            metrics.entry(key).or_insert(value);
        }
    }
}

impl FromIterator<ComparisonEntity> for ComparisonSet {
    fn from_iter<I: IntoIterator<Item = ComparisonEntity>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coercion_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_numeric(&json!(1.5)), Some(1.5));
        assert_eq!(coerce_numeric(&json!(3)), Some(3.0));
        assert_eq!(coerce_numeric(&json!(" 0.25 ")), Some(0.25));
    }

    #[test]
    fn coercion_rejects_everything_else() {
        assert_eq!(coerce_numeric(&json!(true)), None);
        assert_eq!(coerce_numeric(&json!(null)), None);
        assert_eq!(coerce_numeric(&json!("BULLISH")), None);
        assert_eq!(coerce_numeric(&json!("inf")), None);
        assert_eq!(coerce_numeric(&json!([1.0])), None);
    }

    #[test]
    fn parses_array_and_exported_comparison() {
        let array = r#"[{"symbol":"BTC","metrics":{"cv":0.05}},{"symbol":"ETH"}]"#;
        let set = ComparisonSet::from_json_str(array).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.entities()[0].numeric("cv"), Some(0.05));
        assert!(set.entities()[1].prices.is_empty());

        let exported = r#"{"reports":[{"symbol":"SOL","name":"Solana","metrics":{"cv":"0.1"},
            "prices":[{"timestamp":1640000000000,"price":170.0}]}],"correlation":{}}"#;
        let set = ComparisonSet::from_json_str(exported).unwrap();
        assert_eq!(set.entities()[0].numeric("cv"), Some(0.1));
        assert_eq!(set.entities()[0].prices.len(), 1);
    }

    #[test]
    fn exported_market_figures_become_metrics() {
        let exported = r#"{"reports":[{"symbol":"BTC","name":"Bitcoin","current_price":50000.0,
            "market_cap":1000000,"total_volume":null,"exchange_volume":250.5,
            "exchange_pair":"BTCUSDT","metrics":{"cv":0.04,"market_cap":"7"}}]}"#;
        let set = ComparisonSet::from_json_str(exported).unwrap();
        let btc = &set.entities()[0];
        assert_eq!(btc.numeric("current_price"), Some(50000.0));
        assert_eq!(btc.numeric("exchange_volume"), Some(250.5));
        assert_eq!(btc.numeric("cv"), Some(0.04));
        // The explicit metric is kept over the top-level figure.
        assert_eq!(btc.numeric("market_cap"), Some(7.0));
        assert!(!btc.metrics.contains_key("total_volume"));
        assert!(!btc.metrics.contains_key("exchange_pair"));

        let bare = ComparisonSet::from_json_str(r#"[{"symbol":"ETH","market_cap":3.5}]"#).unwrap();
        assert_eq!(bare.entities()[0].numeric("market_cap"), Some(3.5));
        assert_eq!(bare.entities()[0].metrics.len(), 1);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            ComparisonSet::from_json_str(r#"{"tokens":[]}"#),
            Err(ComparatorError::UnexpectedShape)
        ));
        assert!(matches!(
            ComparisonSet::from_json_str(r#"[{"symbol":"  "}]"#),
            Err(ComparatorError::MissingSymbol(0))
        ));
        assert!(matches!(
            ComparisonSet::from_json_str("not json"),
            Err(ComparatorError::Parse(_))
        ));
    }
}
