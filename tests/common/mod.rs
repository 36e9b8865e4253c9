#![allow(dead_code)]

use chrono::NaiveDate;
use goldencross::domain::backtest::{BacktestConfig, BacktestResult};
use goldencross::domain::error::GoldenCrossError;
use goldencross::domain::price::{PricePoint, PriceSeries};
use goldencross::domain::returns::{CostModel, EvaluationSpan};
use goldencross::domain::signal::CrossoverWindows;
use goldencross::domain::stats::EvaluationConfig;
use goldencross::domain::stats::bootstrap::BootstrapConfig;
use goldencross::ports::data_port::PricePort;
use goldencross::ports::report_port::{ReportContext, ReportPort};
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockPricePort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, ticker: &str, prices: &[f64]) -> Self {
        self.data
            .insert(ticker.to_string(), make_series(prices).points().to_vec());
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PricePort for MockPricePort {
    fn fetch_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, GoldenCrossError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(GoldenCrossError::Data {
                reason: reason.clone(),
            });
        }
        let points: Vec<PricePoint> = self
            .data
            .get(ticker)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start && p.date < end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        PriceSeries::new(points)
    }

    fn list_tickers(&self) -> Result<Vec<String>, GoldenCrossError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, GoldenCrossError> {
        Ok(self.data.get(ticker).and_then(|points| {
            let first = points.first()?.date;
            let last = points.last()?.date;
            Some((first, last, points.len()))
        }))
    }
}

/// Reporter that records the tickers it was asked to write.
#[derive(Default)]
pub struct RecordingReporter {
    pub written: RefCell<Vec<String>>,
}

impl ReportPort for RecordingReporter {
    fn write(
        &self,
        _result: &BacktestResult,
        _config: &BacktestConfig,
        ctx: &ReportContext,
    ) -> Result<(), GoldenCrossError> {
        self.written.borrow_mut().push(ctx.ticker.clone());
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One close per calendar day starting 2020-01-01.
pub fn make_series(prices: &[f64]) -> PriceSeries {
    let start = date(2020, 1, 1);
    PriceSeries::new(
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint::new(start + chrono::Duration::days(i as i64), close))
            .collect(),
    )
    .unwrap()
}

/// Strictly increasing for `rising` days, then flat at the last rising close.
pub fn rising_then_flat(rising: usize, flat: usize) -> Vec<f64> {
    let mut prices: Vec<f64> = (0..rising).map(|i| 100.0 + i as f64).collect();
    let last = prices.last().copied().unwrap_or(100.0);
    prices.extend(std::iter::repeat_n(last, flat));
    prices
}

pub fn constant(n: usize, price: f64) -> Vec<f64> {
    vec![price; n]
}

/// Deterministic oscillating series with drift; produces several crossovers.
pub fn wavy(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + 0.05 * t + 8.0 * (t / 9.0).sin() + 2.0 * (t / 2.3).cos()
        })
        .collect()
}

pub fn sample_config(short: usize, long: usize, one_way_bps: f64) -> BacktestConfig {
    BacktestConfig {
        ticker: "TEST".into(),
        start_date: date(2020, 1, 1),
        end_date: date(2024, 12, 31),
        windows: CrossoverWindows::new(short, long).unwrap(),
        costs: CostModel::new(one_way_bps, 0.0),
        span: EvaluationSpan::SignalOnly,
        evaluation: EvaluationConfig {
            bootstrap: BootstrapConfig {
                resamples: 300,
                seed: 42,
            },
            ..EvaluationConfig::default()
        },
    }
}
