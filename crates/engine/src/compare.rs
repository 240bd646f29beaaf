use crate::report::TokenReport;
use comparator::{correlation_matrix, ComparisonEntity, ComparisonReport, ComparisonSet, Comparator, CorrelationMatrix};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The result of comparing several analysed tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    pub comparison: ComparisonReport,
    pub correlation: CorrelationMatrix,
}

impl From<&TokenReport> for ComparisonEntity {
    fn from(report: &TokenReport) -> Self {
        let mut entity = ComparisonEntity::new(report.symbol.to_uppercase())
            .with_prices(report.prices.clone());

        // Market figures are comparable alongside the derived indicators.
        entity = entity
            .with_metric("current_price", option_value(report.current_price))
            .with_metric("market_cap", option_value(report.market_cap))
            .with_metric("total_volume", option_value(report.total_volume))
            .with_metric("exchange_volume", report.exchange_volume);

        for (name, value) in report.metrics.iter() {
            let cell = serde_json::to_value(value).unwrap_or(Value::Null);
            entity = entity.with_metric(name.clone(), cell);
        }
        entity
    }
}

fn option_value(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::from)
}

/// Compares analysed tokens on the requested metrics and correlates their prices.
pub fn compare_reports(reports: &[TokenReport], metrics: &[String]) -> ComparisonOutcome {
    let set: ComparisonSet = reports.iter().map(ComparisonEntity::from).collect();
    compare_set(&set, metrics)
}

/// Same as [`compare_reports`], for a set that was built or loaded elsewhere.
pub fn compare_set(set: &ComparisonSet, metrics: &[String]) -> ComparisonOutcome {
    tracing::debug!(entities = set.len(), metrics = metrics.len(), "Comparing tokens");
    ComparisonOutcome {
        comparison: Comparator::new().compare(set, metrics),
        correlation: correlation_matrix(set),
    }
}
