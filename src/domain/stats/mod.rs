//! Statistical comparison of a strategy return series against a baseline.
//!
//! Every statistic in [`ComparisonReport`] is computed on its own and stored
//! as a `Result`: a degenerate input turns that one field into an error
//! (rendered as "N/A") and leaves the others untouched.

pub mod bootstrap;
pub mod descriptive;
pub mod inference;
pub mod normality;

use self::bootstrap::{BootstrapConfig, BootstrapSharpe, bootstrap_sharpe};
use self::descriptive::NonparametricSummary;
use self::inference::{
    MeanConfidence, TestResult, mann_whitney_u, mean_confidence_interval, welch_t_test,
};
use self::normality::{ShapiroWilk, shapiro_wilk_capped};
use super::metrics::TRADING_DAYS_PER_YEAR;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatError {
    #[error("insufficient data: need {needed} observations, have {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error("too many observations: limit {limit}, have {available}")]
    TooManyObservations { limit: usize, available: usize },

    #[error("zero variance")]
    ZeroVariance,

    #[error("undefined: {reason}")]
    Undefined { reason: String },

    #[error("distribution error: {reason}")]
    Distribution { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationConfig {
    /// Two-sided significance level for confidence intervals.
    pub alpha: f64,
    pub bootstrap: BootstrapConfig,
    /// Shapiro-Wilk subsample cap.
    pub shapiro_cap: usize,
    pub shapiro_seed: u64,
    pub periods_per_year: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            bootstrap: BootstrapConfig::default(),
            shapiro_cap: normality::MAX_SHAPIRO_N,
            shapiro_seed: 42,
            periods_per_year: TRADING_DAYS_PER_YEAR,
        }
    }
}

/// Per-series statistics shared by both sides of the comparison. Point
/// metrics (Sharpe, drawdown) live on the backtest result.
#[derive(Debug, Clone)]
pub struct SeriesStatistics {
    pub mean_ci: Result<MeanConfidence, StatError>,
    pub normality: Result<ShapiroWilk, StatError>,
    pub summary: Result<NonparametricSummary, StatError>,
    pub bootstrap: Result<BootstrapSharpe, StatError>,
}

impl SeriesStatistics {
    pub fn compute(label: &str, returns: &[f64], config: &EvaluationConfig) -> Self {
        Self {
            mean_ci: logged(
                label,
                "mean confidence interval",
                mean_confidence_interval(returns, config.alpha),
            ),
            normality: logged(
                label,
                "shapiro-wilk",
                shapiro_wilk_capped(returns, config.shapiro_cap, config.shapiro_seed),
            ),
            summary: logged(
                label,
                "nonparametric summary",
                NonparametricSummary::compute(returns),
            ),
            bootstrap: logged(
                label,
                "bootstrap sharpe",
                bootstrap_sharpe(returns, &config.bootstrap, config.periods_per_year),
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub strategy: SeriesStatistics,
    pub baseline: SeriesStatistics,
    /// Welch's unequal-variance t-test, strategy vs baseline.
    pub welch: Result<TestResult, StatError>,
    /// Two-sided Mann-Whitney U test, strategy vs baseline.
    pub mann_whitney: Result<TestResult, StatError>,
}

impl ComparisonReport {
    pub fn evaluate(strategy: &[f64], baseline: &[f64], config: &EvaluationConfig) -> Self {
        tracing::debug!(
            strategy = strategy.len(),
            baseline = baseline.len(),
            resamples = config.bootstrap.resamples,
            "evaluating comparison"
        );
        Self {
            strategy: SeriesStatistics::compute("strategy", strategy, config),
            baseline: SeriesStatistics::compute("baseline", baseline, config),
            welch: logged("comparison", "welch t-test", welch_t_test(strategy, baseline)),
            mann_whitney: logged(
                "comparison",
                "mann-whitney u",
                mann_whitney_u(strategy, baseline),
            ),
        }
    }
}

fn logged<T>(label: &str, statistic: &str, result: Result<T, StatError>) -> Result<T, StatError> {
    if let Err(e) = &result {
        tracing::warn!(series = label, statistic, error = %e, "statistic undefined");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wavy(n: usize, phase: f64, scale: f64) -> Vec<f64> {
        (0..n)
            .map(|i| scale * ((i as f64) * 0.37 + phase).sin() + 0.0005)
            .collect()
    }

    #[test]
    fn full_report_on_regular_data() {
        let config = EvaluationConfig {
            bootstrap: BootstrapConfig {
                resamples: 200,
                seed: 42,
            },
            ..EvaluationConfig::default()
        };
        let report = ComparisonReport::evaluate(&wavy(300, 0.0, 0.01), &wavy(300, 1.0, 0.02), &config);

        assert!(report.strategy.mean_ci.is_ok());
        assert!(report.baseline.normality.is_ok());
        assert!(report.strategy.summary.is_ok());
        assert!(report.baseline.bootstrap.is_ok());
        assert!(report.welch.is_ok());
        assert!(report.mann_whitney.is_ok());
    }

    #[test]
    fn degenerate_fields_fail_independently() {
        let config = EvaluationConfig {
            bootstrap: BootstrapConfig {
                resamples: 50,
                seed: 7,
            },
            ..EvaluationConfig::default()
        };
        let flat = vec![0.0; 40];
        let report = ComparisonReport::evaluate(&flat, &wavy(40, 0.5, 0.01), &config);

        assert!(report.strategy.bootstrap.is_err());
        assert!(report.strategy.normality.is_err());
        assert!(report.strategy.mean_ci.is_ok());
        assert!(report.strategy.summary.is_ok());
        assert!(report.baseline.bootstrap.is_ok());
        assert!(report.welch.is_ok());
        assert!(report.mann_whitney.is_ok());
    }

    #[test]
    fn empty_inputs_never_panic() {
        let report = ComparisonReport::evaluate(&[], &[], &EvaluationConfig::default());
        assert!(report.strategy.mean_ci.is_err());
        assert!(report.strategy.normality.is_err());
        assert!(report.strategy.summary.is_err());
        assert!(report.strategy.bootstrap.is_err());
        assert!(report.welch.is_err());
        assert!(report.mann_whitney.is_err());
        assert!(report.baseline.bootstrap.is_err());
    }
}
