//! Backtest run: signals, return accounting, metrics and statistics.
//!
//! BacktestConfig holds every engine parameter; `run_backtest` is a pure
//! function of the price series and the config.

use chrono::NaiveDate;

use super::error::GoldenCrossError;
use super::metrics::{Metrics, cagr, cumulative_curve};
use super::price::PriceSeries;
use super::returns::{CostModel, EvaluationSpan, ReturnLedger, account};
use super::signal::{CrossoverWindows, SignalFrame, generate};
use super::stats::inference::{MeanConfidence, mean_confidence_interval};
use super::stats::{ComparisonReport, EvaluationConfig, StatError};

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub windows: CrossoverWindows,
    pub costs: CostModel,
    pub span: EvaluationSpan,
    pub evaluation: EvaluationConfig,
}

/// Growth-of-1 curves, each one element longer than the ledger.
#[derive(Debug, Clone, Default)]
pub struct CumulativeCurves {
    pub buy_hold: Vec<f64>,
    pub gross: Vec<f64>,
    pub net: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    /// Input closes, aligned with `signals`.
    pub closes: Vec<f64>,
    pub signals: SignalFrame,
    pub ledger: ReturnLedger,
    pub curves: CumulativeCurves,
    pub buy_hold: Metrics,
    pub gross: Metrics,
    pub net: Metrics,
    pub gross_mean_ci: Result<MeanConfidence, StatError>,
    /// Net strategy returns against buy-and-hold.
    pub comparison: ComparisonReport,
    /// First and last date of the curves (base close through last close).
    pub period: Option<(NaiveDate, NaiveDate)>,
}

impl BacktestResult {
    pub fn observations(&self) -> usize {
        self.ledger.len()
    }

    pub fn cagr_buy_hold(&self) -> f64 {
        self.cagr_of(&self.curves.buy_hold)
    }

    pub fn cagr_gross(&self) -> f64 {
        self.cagr_of(&self.curves.gross)
    }

    pub fn cagr_net(&self) -> f64 {
        self.cagr_of(&self.curves.net)
    }

    fn cagr_of(&self, curve: &[f64]) -> f64 {
        match (self.period, curve.last()) {
            (Some((start, end)), Some(&growth)) => cagr(growth, start, end),
            _ => f64::NAN,
        }
    }
}

pub fn run_backtest(
    series: &PriceSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult, GoldenCrossError> {
    tracing::info!(
        ticker = %config.ticker,
        bars = series.len(),
        short = config.windows.short(),
        long = config.windows.long(),
        "running crossover backtest"
    );
    if series.len() < config.windows.long() {
        tracing::warn!(
            bars = series.len(),
            long = config.windows.long(),
            "history shorter than long window; strategy stays flat"
        );
    }

    let signals = generate(series, config.windows);
    let ledger = account(
        series,
        &signals.positions,
        config.costs,
        config.span,
        config.windows.long(),
    )?;

    let curves = CumulativeCurves {
        buy_hold: cumulative_curve(&ledger.buy_hold),
        gross: cumulative_curve(&ledger.gross),
        net: cumulative_curve(&ledger.net),
    };

    let periods = config.evaluation.periods_per_year;
    let buy_hold = Metrics::compute_with_periods(&ledger.buy_hold, periods);
    let gross = Metrics::compute_with_periods(&ledger.gross, periods);
    let net = Metrics::compute_with_periods(&ledger.net, periods);

    let gross_mean_ci = mean_confidence_interval(&ledger.gross, config.evaluation.alpha);
    let comparison = ComparisonReport::evaluate(&ledger.net, &ledger.buy_hold, &config.evaluation);

    let period = ledger
        .base_date(series)
        .zip(ledger.dates.last().copied());

    tracing::info!(
        observations = ledger.len(),
        trades = ledger.trades(),
        "backtest complete"
    );

    Ok(BacktestResult {
        closes: series.closes(),
        signals,
        ledger,
        curves,
        buy_hold,
        gross,
        net,
        gross_mean_ci,
        comparison,
        period,
    })
}
