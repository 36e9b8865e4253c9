//! Return accounting: buy-and-hold, gross strategy and cost-adjusted net returns.
//!
//! A ledger row `k` corresponds to price index `start + k`, where `start` is
//! at least 1 (the first close has no prior close to return against).

use chrono::NaiveDate;

use super::error::GoldenCrossError;
use super::price::PriceSeries;
use super::signal::Position;

const BPS_PER_UNIT: f64 = 10_000.0;

/// Flat per-trade cost in basis points, charged on every position change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostModel {
    pub one_way_bps: f64,
    pub slippage_bps: f64,
}

impl CostModel {
    pub fn new(one_way_bps: f64, slippage_bps: f64) -> Self {
        Self {
            one_way_bps,
            slippage_bps,
        }
    }

    /// Cost per position change as a decimal fraction.
    pub fn rate(&self) -> f64 {
        bps_to_decimal(self.one_way_bps + self.slippage_bps)
    }

    pub fn round_trip_bps(&self) -> f64 {
        2.0 * (self.one_way_bps + self.slippage_bps)
    }
}

pub fn bps_to_decimal(bps: f64) -> f64 {
    bps / BPS_PER_UNIT
}

/// Which indices enter the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationSpan {
    /// Every index with a prior close: `len - 1` rows. Warm-up rows carry a
    /// zero strategy return against a live buy-and-hold return.
    Full,
    /// Only indices where the long average is defined, so both series cover
    /// the same window. History shorter than the long window yields no rows.
    #[default]
    SignalOnly,
}

#[derive(Debug, Clone, Default)]
pub struct ReturnLedger {
    /// Price index of the first row.
    pub start: usize,
    pub dates: Vec<NaiveDate>,
    pub positions: Vec<Position>,
    pub buy_hold: Vec<f64>,
    pub gross: Vec<f64>,
    pub net: Vec<f64>,
    pub turnover: Vec<u8>,
}

impl ReturnLedger {
    pub fn len(&self) -> usize {
        self.buy_hold.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buy_hold.is_empty()
    }

    pub fn trades(&self) -> usize {
        self.turnover.iter().map(|&t| t as usize).sum()
    }

    /// Date of the close the first return is measured against.
    pub fn base_date(&self, series: &PriceSeries) -> Option<NaiveDate> {
        series
            .points()
            .get(self.start.checked_sub(1)?)
            .map(|p| p.date)
    }
}

pub fn account(
    series: &PriceSeries,
    positions: &[Position],
    cost: CostModel,
    span: EvaluationSpan,
    long_window: usize,
) -> Result<ReturnLedger, GoldenCrossError> {
    if positions.len() != series.len() {
        return Err(GoldenCrossError::Alignment {
            expected: series.len(),
            actual: positions.len(),
        });
    }

    let start = match span {
        EvaluationSpan::Full => 1,
        EvaluationSpan::SignalOnly => long_window.saturating_sub(1).max(1),
    };
    if series.len() <= start {
        tracing::debug!(bars = series.len(), start, "no rows to account");
        return Ok(ReturnLedger {
            start,
            ..ReturnLedger::default()
        });
    }

    let rate = cost.rate();
    let points = series.points();
    let rows = series.len() - start;

    let mut ledger = ReturnLedger {
        start,
        dates: Vec::with_capacity(rows),
        positions: Vec::with_capacity(rows),
        buy_hold: Vec::with_capacity(rows),
        gross: Vec::with_capacity(rows),
        net: Vec::with_capacity(rows),
        turnover: Vec::with_capacity(rows),
    };

    for i in start..series.len() {
        let buy_hold = points[i].close / points[i - 1].close - 1.0;
        let gross = buy_hold * positions[i].exposure();
        let turnover = u8::from(positions[i] != positions[i - 1]);
        let net = gross - f64::from(turnover) * rate;

        ledger.dates.push(points[i].date);
        ledger.positions.push(positions[i]);
        ledger.buy_hold.push(buy_hold);
        ledger.gross.push(gross);
        ledger.net.push(net);
        ledger.turnover.push(turnover);
    }

    tracing::debug!(
        rows = ledger.len(),
        trades = ledger.trades(),
        cost_rate = rate,
        "accounted strategy returns"
    );

    Ok(ledger)
}
