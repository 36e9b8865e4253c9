//! Shapiro-Wilk normality test (Royston 1995, algorithm AS R94).
//!
//! Valid for 3 <= n <= 5000. Longer series go through
//! [`shapiro_wilk_capped`], which tests a seeded random subsample.

use rand::SeedableRng;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use statrs::distribution::{ContinuousCDF, Normal};

use super::StatError;
use super::descriptive::{finite, mean, sorted_copy};

pub const MIN_SHAPIRO_N: usize = 3;
pub const MAX_SHAPIRO_N: usize = 5000;

const SMALL: f64 = 1e-19;

// Polynomial coefficients, lowest order first.
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilk {
    pub w: f64,
    pub p_value: f64,
    /// Observations actually tested.
    pub observations: usize,
}

fn poly(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn standard_normal() -> Result<Normal, StatError> {
    Normal::new(0.0, 1.0).map_err(|e| StatError::Distribution {
        reason: e.to_string(),
    })
}

/// Half of the antisymmetric coefficient vector, largest weight first.
fn coefficients(n: usize, normal: &Normal) -> Vec<f64> {
    let half = n / 2;
    if n == 3 {
        return vec![std::f64::consts::FRAC_1_SQRT_2];
    }

    let an25 = n as f64 + 0.25;
    let m: Vec<f64> = (1..=half)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / an25))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / (n as f64).sqrt();

    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; half];
    a[0] = a1;

    let (first, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
            / (1.0 - 2.0 * a1.powi(2) - 2.0 * a2.powi(2)))
        .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a1.powi(2))).sqrt();
        (1, fac)
    };
    for i in first..half {
        a[i] = -m[i] / fac;
    }
    a
}

pub fn shapiro_wilk(values: &[f64]) -> Result<ShapiroWilk, StatError> {
    let x = sorted_copy(&finite(values));
    let n = x.len();
    if n < MIN_SHAPIRO_N {
        return Err(StatError::InsufficientData {
            needed: MIN_SHAPIRO_N,
            available: n,
        });
    }
    if n > MAX_SHAPIRO_N {
        return Err(StatError::TooManyObservations {
            limit: MAX_SHAPIRO_N,
            available: n,
        });
    }
    let range = x[n - 1] - x[0];
    if range < SMALL {
        return Err(StatError::ZeroVariance);
    }

    let normal = standard_normal()?;
    let a = coefficients(n, &normal);

    // Scale by the range to keep the sums well conditioned.
    let scaled: Vec<f64> = x.iter().map(|v| v / range).collect();
    let xbar = mean(&scaled);
    let ssx: f64 = scaled.iter().map(|v| (v - xbar).powi(2)).sum();
    let ssa: f64 = 2.0 * a.iter().map(|v| v * v).sum::<f64>();
    let b: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (scaled[n - 1 - i] - scaled[i]))
        .sum();
    let w = (b * b / (ssa * ssx)).min(1.0);

    let p_value = shapiro_p_value(w, n, &normal);
    Ok(ShapiroWilk {
        w,
        p_value,
        observations: n,
    })
}

fn shapiro_p_value(w: f64, n: usize, normal: &Normal) -> f64 {
    if n == 3 {
        const PI6: f64 = 6.0 / std::f64::consts::PI;
        const STQR: f64 = std::f64::consts::FRAC_PI_3;
        return (PI6 * (w.sqrt().asin() - STQR)).max(0.0);
    }
    if w >= 1.0 {
        return 1.0;
    }

    let nf = n as f64;
    let mut y = (1.0 - w).ln();
    let (m, s) = if n <= 11 {
        let gamma = poly(&G, nf);
        if y >= gamma {
            return 1e-99;
        }
        y = -(gamma - y).ln();
        (poly(&C3, nf), poly(&C4, nf).exp())
    } else {
        let ln_n = nf.ln();
        (poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };
    normal.sf((y - m) / s)
}

/// Shapiro-Wilk on at most `cap` observations.
///
/// When the series is longer than `cap`, exactly `cap` observations are drawn
/// without replacement using a generator seeded with `seed`.
pub fn shapiro_wilk_capped(values: &[f64], cap: usize, seed: u64) -> Result<ShapiroWilk, StatError> {
    let x = finite(values);
    let cap = cap.min(MAX_SHAPIRO_N);
    if x.len() <= cap {
        return shapiro_wilk(&x);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let sample: Vec<f64> = index::sample(&mut rng, x.len(), cap)
        .into_iter()
        .map(|i| x[i])
        .collect();
    tracing::debug!(from = x.len(), to = cap, seed, "subsampled for shapiro-wilk");
    shapiro_wilk(&sample)
}
