//! Windowed statistics shared by the metric modules.
//!
//! All helpers operate on plain `f64` slices and never panic on short input; they
//! return `None` (or an empty vector) instead.

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (Bessel-corrected, ddof = 1).
///
/// Returns `None` below two observations. A slice of identical values returns exactly
/// `0.0`, independent of rounding in the mean.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let first = values[0];
    if values.iter().all(|v| *v == first) {
        return Some(0.0);
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// The last `window` values, or `None` when the slice is shorter than the window.
pub fn tail(values: &[f64], window: usize) -> Option<&[f64]> {
    if window == 0 || values.len() < window {
        return None;
    }
    Some(&values[values.len() - window..])
}

/// Simple moving average of the trailing `window` values.
pub fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    tail(values, window).and_then(mean)
}

/// Sample standard deviation of the trailing `window` values.
pub fn trailing_std(values: &[f64], window: usize) -> Option<f64> {
    tail(values, window).and_then(sample_std)
}

/// Exponential moving average in its non-adjusted recursive form.
///
/// `alpha = 2 / (span + 1)`, seeded with the first observation:
/// `ema[0] = x[0]`, `ema[t] = alpha * x[t] + (1 - alpha) * ema[t - 1]`.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &value in values {
        let next = match prev {
            None => value,
            Some(p) => alpha * value + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// First differences, `x[t] - x[t - 1]`.
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Simple period returns, `(x[t] - x[t - 1]) / x[t - 1]`.
///
/// Periods whose previous value is zero have no defined return and are skipped.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}
