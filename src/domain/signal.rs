//! Golden cross / death cross signal generation.
//!
//! `signals[i]` compares SMA(short)[i] with SMA(long)[i] and is `None` until
//! both averages are defined. `positions[i]` is `signals[i - 1]`, so the
//! position held on day `i` only uses closes up to day `i - 1`.

use chrono::NaiveDate;

use super::error::GoldenCrossError;
use super::indicator::MovingAverage;
use super::indicator::sma::calculate_sma;
use super::price::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long,
}

impl Position {
    /// Fraction of capital exposed to the asset: 0 or 1.
    pub fn exposure(self) -> f64 {
        match self {
            Position::Flat => 0.0,
            Position::Long => 1.0,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Position::Flat => 0,
            Position::Long => 1,
        }
    }
}

/// Validated short/long window pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverWindows {
    short: usize,
    long: usize,
}

impl CrossoverWindows {
    pub fn new(short: usize, long: usize) -> Result<Self, GoldenCrossError> {
        if short == 0 {
            return Err(GoldenCrossError::invalid(
                "strategy",
                "short_window",
                "short_window must be positive",
            ));
        }
        if long <= short {
            return Err(GoldenCrossError::invalid(
                "strategy",
                "long_window",
                format!("long_window ({long}) must exceed short_window ({short})"),
            ));
        }
        Ok(Self { short, long })
    }

    pub fn short(&self) -> usize {
        self.short
    }

    pub fn long(&self) -> usize {
        self.long
    }
}

impl Default for CrossoverWindows {
    fn default() -> Self {
        Self {
            short: 50,
            long: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossKind {
    GoldenCross,
    DeathCross,
}

/// A position change, located on the day the new position takes effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossEvent {
    pub index: usize,
    pub date: NaiveDate,
    pub kind: CrossKind,
    /// Short-average value on that day, for chart markers.
    pub marker: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SignalFrame {
    pub dates: Vec<NaiveDate>,
    pub short_ma: MovingAverage,
    pub long_ma: MovingAverage,
    pub signals: Vec<Option<Position>>,
    pub positions: Vec<Position>,
}

impl SignalFrame {
    pub fn crossovers(&self) -> Vec<CrossEvent> {
        self.positions
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[0] != w[1])
            .map(|(i, w)| {
                let index = i + 1;
                CrossEvent {
                    index,
                    date: self.dates[index],
                    kind: match w[1] {
                        Position::Long => CrossKind::GoldenCross,
                        Position::Flat => CrossKind::DeathCross,
                    },
                    marker: self.short_ma.get(index),
                }
            })
            .collect()
    }

    /// Days spent long.
    pub fn days_long(&self) -> usize {
        self.positions
            .iter()
            .filter(|&&p| p == Position::Long)
            .count()
    }
}

pub fn generate(series: &PriceSeries, windows: CrossoverWindows) -> SignalFrame {
    let short_ma = calculate_sma(series, windows.short());
    let long_ma = calculate_sma(series, windows.long());

    let signals: Vec<Option<Position>> = (0..series.len())
        .map(|i| match (short_ma.get(i), long_ma.get(i)) {
            (Some(s), Some(l)) if s > l => Some(Position::Long),
            (Some(_), Some(_)) => Some(Position::Flat),
            _ => None,
        })
        .collect();

    let positions: Vec<Position> = (0..series.len())
        .map(|i| {
            if i == 0 {
                Position::Flat
            } else {
                signals[i - 1].unwrap_or_default()
            }
        })
        .collect();

    tracing::debug!(
        short = windows.short(),
        long = windows.long(),
        bars = series.len(),
        "generated crossover positions"
    );

    SignalFrame {
        dates: series.dates(),
        short_ma,
        long_ma,
        signals,
        positions,
    }
}
