//! Descriptive statistics over plain `f64` slices.
//!
//! Functions return NaN instead of failing when the input is too short;
//! callers that need a reason use the `Result`-returning wrappers.

use super::StatError;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Bessel-corrected sample variance, NaN below two observations.
///
/// Deviations are taken from the first value, so a constant series has a
/// variance of exactly zero.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let shift = values[0];
    let (sum, sum_sq) = values.iter().fold((0.0, 0.0), |(s, ss), v| {
        let d = v - shift;
        (s + d, ss + d * d)
    });
    ((sum_sq - sum * sum / n as f64) / (n - 1) as f64).max(0.0)
}

pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Linearly interpolated percentile of an ascending slice, `q` in [0, 100].
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let h = (n - 1) as f64 * (q / 100.0).clamp(0.0, 1.0);
            let lo = h.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
        }
    }
}

pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Drop NaN and infinite values.
pub fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonparametricSummary {
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
}

impl NonparametricSummary {
    pub fn compute(values: &[f64]) -> Result<Self, StatError> {
        let sorted = sorted_copy(&finite(values));
        if sorted.is_empty() {
            return Err(StatError::InsufficientData {
                needed: 1,
                available: 0,
            });
        }
        Ok(Self {
            median: percentile_sorted(&sorted, 50.0),
            q1: percentile_sorted(&sorted, 25.0),
            q3: percentile_sorted(&sorted, 75.0),
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}
