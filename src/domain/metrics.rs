//! Performance metrics for a daily return series.

use chrono::NaiveDate;

use super::stats::descriptive::{mean, sample_std};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub observations: usize,
    pub mean_daily: f64,
    pub std_daily: f64,
    pub mean_annual: f64,
    pub std_annual: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub total_return: f64,
}

impl Metrics {
    pub fn compute(returns: &[f64]) -> Self {
        Self::compute_with_periods(returns, TRADING_DAYS_PER_YEAR)
    }

    pub fn compute_with_periods(returns: &[f64], periods_per_year: f64) -> Self {
        let mean_daily = mean(returns);
        let std_daily = sample_std(returns);
        let mean_annual = mean_daily * periods_per_year;
        let std_annual = std_daily * periods_per_year.sqrt();

        let curve = cumulative_curve(returns);
        let total_return = curve.last().map_or(f64::NAN, |g| g - 1.0);

        Metrics {
            observations: returns.len(),
            mean_daily,
            std_daily,
            mean_annual,
            std_annual,
            sharpe: annualized_sharpe(mean_annual, std_annual),
            max_drawdown: max_drawdown(&curve),
            total_return,
        }
    }
}

/// `mean_annual / std_annual`, NaN unless the volatility is positive.
pub fn annualized_sharpe(mean_annual: f64, std_annual: f64) -> f64 {
    if std_annual > 0.0 {
        mean_annual / std_annual
    } else {
        f64::NAN
    }
}

/// Growth of 1 unit: `curve[0] = 1`, `curve[k + 1] = curve[k] * (1 + r[k])`.
pub fn cumulative_curve(returns: &[f64]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(returns.len() + 1);
    curve.push(1.0);
    let mut growth = 1.0;
    for r in returns {
        growth *= 1.0 + r;
        curve.push(growth);
    }
    curve
}

/// Per-point decline from the running peak; every value is <= 0.
fn drawdown_series(curve: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    curve
        .iter()
        .map(|&value| {
            peak = peak.max(value);
            if peak > 0.0 { (value - peak) / peak } else { 0.0 }
        })
        .collect()
}

/// Most negative drawdown of the curve, 0 for a non-decreasing curve.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    drawdown_series(curve).into_iter().fold(0.0, f64::min)
}

/// Compound annual growth rate over a calendar span.
pub fn cagr(total_growth: f64, start: NaiveDate, end: NaiveDate) -> f64 {
    let years = (end - start).num_days() as f64 / DAYS_PER_YEAR;
    if years <= 0.0 || total_growth <= 0.0 {
        return f64::NAN;
    }
    total_growth.powf(1.0 / years) - 1.0
}
