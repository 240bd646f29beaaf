use crate::entity::ComparisonSet;
use crate::stats::{average_rank, MetricSummary};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single metric of one entity, placed relative to the rest of the set.
///
/// Every field is `None` when the entity has no usable value for the metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoredMetric {
    pub value: Option<f64>,
    /// Deviation from the set mean, in percent of the mean's magnitude.
    pub dev_pct: Option<f64>,
    pub z_score: Option<f64>,
    /// Average rank scaled to 0–100.
    pub percentile: Option<f64>,
}

/// The augmented record of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityScores {
    pub symbol: String,
    pub metrics: IndexMap<String, ScoredMetric>,
}

impl EntityScores {
    pub fn get(&self, metric: &str) -> Option<&ScoredMetric> {
        self.metrics.get(metric)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// One record per entity, in set order.
    pub entities: Vec<EntityScores>,
    /// One summary per compared metric, in request order.
    pub summaries: Vec<MetricSummary>,
}

impl ComparisonReport {
    pub fn summary(&self, metric: &str) -> Option<&MetricSummary> {
        self.summaries.iter().find(|s| s.metric == metric)
    }

    /// The metrics that were actually compared.
    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.summaries.iter().map(|s| s.metric.as_str())
    }
}

/// Places every entity of a set relative to its peers, metric by metric.
#[derive(Debug, Default)]
pub struct Comparator {}

impl Comparator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes summary statistics and per-entity scores for the requested metrics.
    ///
    /// A requested metric is included when at least one entity carries it, even if no
    /// value is numeric; its summary then has a count of zero and every score is `None`.
    /// Metrics absent from every entity are skipped. Missing values never raise; they
    /// surface as `None` in the scores.
    pub fn compare(&self, set: &ComparisonSet, metrics: &[String]) -> ComparisonReport {
        let mut entities: Vec<EntityScores> = set
            .iter()
            .map(|e| EntityScores {
                symbol: e.symbol.clone(),
                metrics: IndexMap::new(),
            })
            .collect();
        let mut summaries = Vec::new();

        for metric in metrics {
            if !set.iter().any(|e| e.metrics.contains_key(metric)) {
                tracing::debug!(metric = %metric, "No entity carries this metric; skipping");
                continue;
            }

            // 1. Coerce
            let column: Vec<Option<f64>> = set.iter().map(|e| e.numeric(metric)).collect();
            let present: Vec<f64> = column.iter().flatten().copied().collect();

            // 2. Summarise
            let summary = MetricSummary::from_values(metric.as_str(), &present);

            // 3. Score
            for (scores, value) in entities.iter_mut().zip(&column) {
                let scored = value.map_or_else(ScoredMetric::default, |v| {
                    score(v, &summary, &present)
                });
                scores.metrics.insert(metric.clone(), scored);
            }
            summaries.push(summary);
        }

        ComparisonReport { entities, summaries }
    }
}

fn score(value: f64, summary: &MetricSummary, present: &[f64]) -> ScoredMetric {
    let Some(mean) = summary.mean else {
        return ScoredMetric::default();
    };
    let dev_pct = if mean != 0.0 {
        (value - mean) / mean.abs() * 100.0
    } else {
        0.0
    };
    let z_score = match summary.std {
        Some(std) if std != 0.0 => (value - mean) / std,
        _ => 0.0,
    };
    let percentile = average_rank(value, present) * 100.0 / summary.count as f64;

    ScoredMetric {
        value: Some(value),
        dev_pct: Some(dev_pct),
        z_score: Some(z_score),
        percentile: Some(percentile),
    }
}
