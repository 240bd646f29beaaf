use crate::series;
use core_types::MetricResult;
use serde::{Deserialize, Serialize};

/// Look-back for the short-window volume average.
pub const VOLUME_WINDOW: usize = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeMetrics {
    /// Latest volume relative to the trailing 7-point average, in percent.
    pub vol_change_7d: f64,
}

impl VolumeMetrics {
    pub fn to_metric_result(&self) -> MetricResult {
        let mut out = MetricResult::new();
        out.insert("vol_change_7d", self.vol_change_7d);
        out
    }
}

/// Short-window volume rate of change.
///
/// Uses the mean of the last 7 volumes, or of all volumes when fewer are available.
/// `prices` is accepted for alignment with the other modules and is not read.
pub fn volume_change(_prices: &[f64], volumes: &[f64]) -> VolumeMetrics {
    let Some(&current) = volumes.last() else {
        return VolumeMetrics::default();
    };

    let window = series::tail(volumes, VOLUME_WINDOW).unwrap_or(volumes);
    let avg = series::mean(window).unwrap_or(0.0);
    let vol_change_7d = if avg != 0.0 { (current - avg) / avg * 100.0 } else { 0.0 };

    VolumeMetrics { vol_change_7d }
}

/// Relative disagreement between two independently reported volumes, in percent of
/// the first source.
pub fn volume_delta(source_a: f64, source_b: f64) -> f64 {
    if source_a == 0.0 {
        return 0.0;
    }
    (source_a - source_b).abs() / source_a * 100.0
}

/// Beta-like ratio of a token's coefficient of variation to a reference asset's.
///
/// Both inputs must be non-zero for the ratio to be meaningful.
pub fn beta_proxy(token_cv: f64, reference_cv: f64) -> Option<f64> {
    if token_cv == 0.0 || reference_cv == 0.0 {
        return None;
    }
    Some(token_cv / reference_cv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_volumes_yield_zero() {
        assert_eq!(volume_change(&[], &[]).vol_change_7d, 0.0);
    }

    #[test]
    fn uses_last_seven_points() {
        let volumes = [50_000.0, 60_000.0, 55_000.0, 65_000.0, 58_000.0, 62_000.0, 70_000.0, 75_000.0];
        let avg = volumes[1..].iter().sum::<f64>() / 7.0;
        let expected = (75_000.0 - avg) / avg * 100.0;
        let got = volume_change(&[100.0; 10], &volumes).vol_change_7d;
        assert!((got - expected).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_all_points_when_short() {
        let volumes = [50_000.0, 60_000.0, 70_000.0];
        let got = volume_change(&[100.0, 105.0, 102.0], &volumes).vol_change_7d;
        assert!((got - (70_000.0 - 60_000.0) / 60_000.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_average_is_guarded() {
        assert_eq!(volume_change(&[], &[0.0, 0.0]).vol_change_7d, 0.0);
    }

    #[test]
    fn volume_delta_is_relative_to_first_source() {
        assert_eq!(volume_delta(200.0, 150.0), 25.0);
        assert_eq!(volume_delta(200.0, 250.0), 25.0);
        assert_eq!(volume_delta(0.0, 10.0), 0.0);
    }

    #[test]
    fn beta_proxy_requires_both_volatilities() {
        assert_eq!(beta_proxy(0.1, 0.05), Some(2.0));
        assert_eq!(beta_proxy(0.0, 0.05), None);
        assert_eq!(beta_proxy(0.1, 0.0), None);
    }
}
