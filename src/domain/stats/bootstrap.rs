//! Bootstrap confidence interval for the annualised Sharpe ratio.
//!
//! Each call builds its own `ChaCha8Rng` from the configured seed, so equal
//! inputs and seeds give bit-identical output regardless of what ran before.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::StatError;
use super::descriptive::{finite, mean, percentile_sorted, sample_std, sorted_copy};
use crate::domain::metrics::annualized_sharpe;

const LOWER_PERCENTILE: f64 = 2.5;
const UPPER_PERCENTILE: f64 = 97.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapConfig {
    pub resamples: usize,
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            resamples: 5000,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapSharpe {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    /// Resamples with non-zero standard deviation.
    pub valid_resamples: usize,
}

fn resample_sharpe(sample: &[f64], periods_per_year: f64) -> Option<f64> {
    let sd = sample_std(sample);
    if sd == 0.0 || !sd.is_finite() {
        return None;
    }
    let sharpe = annualized_sharpe(mean(sample) * periods_per_year, sd * periods_per_year.sqrt());
    sharpe.is_finite().then_some(sharpe)
}

pub fn bootstrap_sharpe(
    returns: &[f64],
    config: &BootstrapConfig,
    periods_per_year: f64,
) -> Result<BootstrapSharpe, StatError> {
    let x = finite(returns);
    let n = x.len();
    if n == 0 {
        return Err(StatError::InsufficientData {
            needed: 1,
            available: 0,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut sample = vec![0.0; n];
    let mut sharpes = Vec::with_capacity(config.resamples);

    for _ in 0..config.resamples {
        for slot in sample.iter_mut() {
            *slot = x[rng.gen_range(0..n)];
        }
        if let Some(sharpe) = resample_sharpe(&sample, periods_per_year) {
            sharpes.push(sharpe);
        }
    }

    if sharpes.is_empty() {
        return Err(StatError::Undefined {
            reason: format!("all {} resamples had zero variance", config.resamples),
        });
    }

    let sorted = sorted_copy(&sharpes);
    let result = BootstrapSharpe {
        mean: mean(&sharpes),
        lower: percentile_sorted(&sorted, LOWER_PERCENTILE),
        upper: percentile_sorted(&sorted, UPPER_PERCENTILE),
        valid_resamples: sharpes.len(),
    };
    tracing::debug!(
        resamples = config.resamples,
        valid = result.valid_resamples,
        mean = result.mean,
        "bootstrap sharpe"
    );
    Ok(result)
}
