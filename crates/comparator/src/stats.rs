use analytics::series;
use serde::{Deserialize, Serialize};

/// Descriptive statistics of one metric across the entities that report it.
///
/// A metric that some entity carries but none reports numerically has a count of zero
/// and no statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub metric: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl MetricSummary {
    /// Summarises the present values of a metric.
    pub fn from_values(metric: impl Into<String>, values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            metric: metric.into(),
            count: sorted.len(),
            mean: series::mean(values),
            std: series::sample_std(values),
            min: sorted.first().copied(),
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }
}

/// Quantile of an ascending slice using linear interpolation between closest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    match sorted.len() {
        0 => None,
        1 => Some(sorted[0]),
        n => {
            let position = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = position.floor() as usize;
            let upper = position.ceil() as usize;
            let fraction = position - lower as f64;
            Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
        }
    }
}

/// 1-based ascending rank of `value` among `values`, with ties sharing their average rank.
pub fn average_rank(value: f64, values: &[f64]) -> f64 {
    let below = values.iter().filter(|v| **v < value).count();
    let equal = values.iter().filter(|v| **v == value).count();
    below as f64 + (equal as f64 + 1.0) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_four_values() {
        let summary = MetricSummary::from_values("cv", &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, Some(2.5));
        assert_eq!(summary.min, Some(1.0));
        assert_eq!(summary.max, Some(4.0));
        assert_eq!(summary.q25, Some(1.75));
        assert_eq!(summary.median, Some(2.5));
        assert_eq!(summary.q75, Some(3.25));
        let expected_std = (5.0_f64 / 3.0).sqrt();
        assert!((summary.std.unwrap() - expected_std).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_no_std() {
        let summary = MetricSummary::from_values("cv", &[0.3]);
        assert_eq!(summary.std, None);
        assert_eq!(summary.median, Some(0.3));
    }

    #[test]
    fn no_values_give_an_empty_summary() {
        let summary = MetricSummary::from_values("trend", &[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean, None);
        assert_eq!(summary.std, None);
        assert_eq!(summary.min, None);
        assert_eq!(summary.median, None);
        assert_eq!(summary.max, None);
    }

    #[test]
    fn ties_share_average_rank() {
        let values = [10.0, 20.0, 20.0, 30.0];
        assert_eq!(average_rank(10.0, &values), 1.0);
        assert_eq!(average_rank(20.0, &values), 2.5);
        assert_eq!(average_rank(30.0, &values), 4.0);
    }

    #[test]
    fn rank_counts_only_strictly_smaller_values() {
        let values = [-2.5, 0.0, 7.0, -2.5, 3.0];
        assert_eq!(average_rank(-2.5, &values), 1.5);
        assert_eq!(average_rank(0.0, &values), 3.0);
        assert_eq!(average_rank(3.0, &values), 4.0);
        assert_eq!(average_rank(7.0, &values), 5.0);
        // A value absent from the set still ranks after everything below it.
        assert_eq!(average_rank(1.0, &values), 3.5);
    }

    #[test]
    fn summary_std_agrees_with_shared_series_helper() {
        let values = [0.12, 0.48, 0.33, 0.91, 0.05];
        let summary = MetricSummary::from_values("cv", &values);
        assert_eq!(summary.std, series::sample_std(&values));
        assert_eq!(summary.mean, series::mean(&values));
        assert_eq!(MetricSummary::from_values("cv", &[0.4; 3]).std, Some(0.0));
    }
}
