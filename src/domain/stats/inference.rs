//! Confidence intervals and two-sample hypothesis tests.
//!
//! Non-finite observations are dropped from each sample independently before
//! any statistic is computed; the two samples are never paired.

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use super::StatError;
use super::descriptive::{finite, mean, sample_variance};

/// Up to this size (smaller sample, no ties) the exact U distribution is used.
const MANN_WHITNEY_EXACT_MAX: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanConfidence {
    pub observations: usize,
    pub mean: f64,
    pub std_error: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
}

fn students_t(df: f64) -> Result<StudentsT, StatError> {
    StudentsT::new(0.0, 1.0, df).map_err(|e| StatError::Distribution {
        reason: e.to_string(),
    })
}

fn standard_normal() -> Result<Normal, StatError> {
    Normal::new(0.0, 1.0).map_err(|e| StatError::Distribution {
        reason: e.to_string(),
    })
}

/// `mean ± t(1 - alpha/2, n - 1) * s / sqrt(n)`.
pub fn mean_confidence_interval(values: &[f64], alpha: f64) -> Result<MeanConfidence, StatError> {
    let x = finite(values);
    let n = x.len();
    if n < 2 {
        return Err(StatError::InsufficientData {
            needed: 2,
            available: n,
        });
    }
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(StatError::Undefined {
            reason: format!("alpha {alpha} outside (0, 1)"),
        });
    }

    let m = mean(&x);
    let std_error = (sample_variance(&x) / n as f64).sqrt();
    if !std_error.is_finite() {
        return Err(StatError::Undefined {
            reason: "standard error is not finite".into(),
        });
    }

    let t_crit = students_t((n - 1) as f64)?.inverse_cdf(1.0 - alpha / 2.0);
    let half_width = t_crit * std_error;

    Ok(MeanConfidence {
        observations: n,
        mean: m,
        std_error,
        lower: m - half_width,
        upper: m + half_width,
    })
}

/// Welch's unequal-variance t-test, two-sided.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<TestResult, StatError> {
    let a = finite(a);
    let b = finite(b);
    let available = a.len().min(b.len());
    if available < 2 {
        return Err(StatError::InsufficientData {
            needed: 2,
            available,
        });
    }

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let va = sample_variance(&a) / na;
    let vb = sample_variance(&b) / nb;
    let se2 = va + vb;
    if se2 <= 0.0 || !se2.is_finite() {
        return Err(StatError::ZeroVariance);
    }

    let statistic = (mean(&a) - mean(&b)) / se2.sqrt();
    let df = se2.powi(2) / (va.powi(2) / (na - 1.0) + vb.powi(2) / (nb - 1.0));
    let p_value = (2.0 * students_t(df)?.sf(statistic.abs())).min(1.0);

    tracing::debug!(t = statistic, df, p = p_value, "welch t-test");
    Ok(TestResult { statistic, p_value })
}

/// Midranks (1-based) of `values` and the sizes of every tie group.
fn rank_with_ties(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut ranks = vec![0.0; values.len()];
    let mut ties = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let midrank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = midrank;
        }
        if end - start > 1 {
            ties.push(end - start);
        }
        start = end;
    }
    (ranks, ties)
}

/// Two-sided Mann-Whitney U test. `statistic` is U for the first sample.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Result<TestResult, StatError> {
    let a = finite(a);
    let b = finite(b);
    let available = a.len().min(b.len());
    if available == 0 {
        return Err(StatError::InsufficientData {
            needed: 1,
            available,
        });
    }

    let (n1, n2) = (a.len(), b.len());
    let combined: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    let (ranks, ties) = rank_with_ties(&combined);

    let rank_sum: f64 = ranks[..n1].iter().sum();
    let u1 = rank_sum - (n1 * (n1 + 1)) as f64 / 2.0;
    let u2 = (n1 * n2) as f64 - u1;
    let u_max = u1.max(u2);

    let p_value = if ties.is_empty() && n1.min(n2) <= MANN_WHITNEY_EXACT_MAX {
        exact_u_upper_tail(u_max.round() as usize, n1, n2) * 2.0
    } else {
        let n = (n1 + n2) as f64;
        let tie_term: f64 = ties.iter().map(|&t| (t.pow(3) - t) as f64).sum();
        let sigma =
            ((n1 * n2) as f64 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();
        if sigma <= 0.0 || !sigma.is_finite() {
            return Err(StatError::ZeroVariance);
        }
        let z = (u_max - (n1 * n2) as f64 / 2.0 - 0.5) / sigma;
        standard_normal()?.sf(z) * 2.0
    };

    Ok(TestResult {
        statistic: u1,
        p_value: p_value.clamp(0.0, 1.0),
    })
}

/// P(U >= k) under the null for sample sizes `n1`, `n2` without ties.
///
/// The counts of arrangements per U value are the coefficients of the
/// Gaussian binomial `[n1 + n2 choose m]_q` with `m = min(n1, n2)`, built as
/// a product of `(1 - q^(N-m+i)) / (1 - q^i)` factors.
fn exact_u_upper_tail(k: usize, n1: usize, n2: usize) -> f64 {
    let m = n1.min(n2);
    let total_n = n1 + n2;
    let max_degree = n1 * n2;

    let mut coeffs = vec![0.0_f64; max_degree + 1];
    coeffs[0] = 1.0;
    let mut degree = 0;

    for i in 1..=m {
        let a = total_n - m + i;
        let new_degree = degree + a;
        if coeffs.len() <= new_degree {
            coeffs.resize(new_degree + 1, 0.0);
        }
        for j in (a..=new_degree).rev() {
            coeffs[j] -= coeffs[j - a];
        }
        degree = new_degree;

        for j in i..=degree {
            coeffs[j] += coeffs[j - i];
        }
        degree -= i;
    }

    let total: f64 = coeffs[..=max_degree].iter().sum();
    if k > max_degree {
        return 0.0;
    }
    coeffs[k..=max_degree].iter().sum::<f64>() / total
}
