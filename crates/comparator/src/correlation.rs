use crate::entity::ComparisonSet;
use chrono::NaiveDate;
use core_types::PriceSeries;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Pearson correlation of daily prices, indexed by symbol.
///
/// Square and symmetric with a unit diagonal. Empty when fewer than two entities have
/// prices or when their daily series share fewer than two days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub symbols: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        Some(self.values[i][j])
    }
}

/// Buckets a price series by UTC calendar day and averages each bucket.
pub fn daily_means(prices: &PriceSeries) -> BTreeMap<NaiveDate, f64> {
    let mut buckets: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for point in prices.points() {
        let entry = buckets.entry(point.timestamp.date_naive()).or_insert((0.0, 0));
        entry.0 += point.price;
        entry.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(day, (sum, count))| (day, sum / count as f64))
        .collect()
}

/// Builds the correlation matrix of the set's daily price series.
///
/// Entities without prices are left out. The remaining series are inner-joined on
/// calendar day before correlating.
pub fn correlation_matrix(set: &ComparisonSet) -> CorrelationMatrix {
    let series: Vec<(&str, BTreeMap<NaiveDate, f64>)> = set
        .iter()
        .filter(|e| !e.prices.is_empty())
        .map(|e| (e.symbol.as_str(), daily_means(&e.prices)))
        .collect();

    if series.len() < 2 {
        tracing::debug!(usable = series.len(), "Not enough price series to correlate");
        return CorrelationMatrix::default();
    }

    let shared_days: BTreeSet<NaiveDate> = series
        .iter()
        .map(|(_, daily)| daily.keys().copied().collect::<BTreeSet<_>>())
        .reduce(|acc, days| acc.intersection(&days).copied().collect())
        .unwrap_or_default();

    if shared_days.len() < 2 {
        tracing::debug!(shared_days = shared_days.len(), "Price series do not overlap enough");
        return CorrelationMatrix::default();
    }

    let aligned: Vec<Vec<f64>> = series
        .iter()
        .map(|(_, daily)| shared_days.iter().filter_map(|d| daily.get(d).copied()).collect())
        .collect();

    let n = aligned.len();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let r = pearson(&aligned[i], &aligned[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        symbols: series.iter().map(|(s, _)| s.to_string()).collect(),
        values,
    }
}

/// Pearson coefficient of two equally long samples, clamped to [-1, 1].
///
/// A sample with no variance has no defined correlation and yields 0.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in x[..n].iter().zip(&y[..n]) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}
