use crate::enums::Trend;
use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A single cell of a metric dictionary.
///
/// `Null` means "not available" and is deliberately distinct from `Number(0.0)`,
/// which means "computed, and the answer is zero".
///
/// On the wire a number is a JSON number, a trend is its label and `Null` is `null`.
/// Non-finite numbers have no JSON form and are written as the strings `"Infinity"`,
/// `"-Infinity"` and `"NaN"`, so an unbounded ratio never reads back as missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Number(f64),
    Trend(Trend),
    Null,
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_trend(&self) -> Option<Trend> {
        match self {
            MetricValue::Trend(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetricValue::Null)
    }
}

const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";
const NAN: &str = "NaN";

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Number(v) if v.is_nan() => serializer.serialize_str(NAN),
            MetricValue::Number(v) if *v == f64::INFINITY => serializer.serialize_str(INFINITY),
            MetricValue::Number(v) if *v == f64::NEG_INFINITY => {
                serializer.serialize_str(NEG_INFINITY)
            }
            MetricValue::Number(v) => serializer.serialize_f64(*v),
            MetricValue::Trend(t) => t.serialize(serializer),
            MetricValue::Null => serializer.serialize_none(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMetric {
    Number(f64),
    Label(String),
    Null,
}

impl<'de> Deserialize<'de> for MetricValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawMetric::deserialize(deserializer)? {
            RawMetric::Number(v) => Ok(MetricValue::Number(v)),
            RawMetric::Null => Ok(MetricValue::Null),
            RawMetric::Label(label) => match label.as_str() {
                INFINITY => Ok(MetricValue::Number(f64::INFINITY)),
                NEG_INFINITY => Ok(MetricValue::Number(f64::NEG_INFINITY)),
                NAN => Ok(MetricValue::Number(f64::NAN)),
                other => [Trend::Bullish, Trend::Bearish, Trend::Neutral]
                    .into_iter()
                    .find(|t| t.as_str() == other)
                    .map(MetricValue::Trend)
                    .ok_or_else(|| de::Error::custom(format!("unknown metric label `{other}`"))),
            },
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Number(value)
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(MetricValue::Null, MetricValue::Number)
    }
}

impl From<Trend> for MetricValue {
    fn from(value: Trend) -> Self {
        MetricValue::Trend(value)
    }
}

/// A flat, ordered mapping of metric name to value, produced once per analysis call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricResult(IndexMap<String, MetricValue>);

impl MetricResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a metric. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<MetricValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Appends every entry of `other`, consuming it.
    pub fn extend(&mut self, other: MetricResult) {
        self.0.extend(other.0);
    }

    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.0.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(MetricValue::as_f64)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetricValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, MetricValue)> for MetricResult {
    fn from_iter<I: IntoIterator<Item = (String, MetricValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
