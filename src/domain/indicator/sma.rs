//! Simple Moving Average.
//!
//! O(n) sliding window: a running sum over a fixed-size buffer.
//! SMA(n)[i] = (P[i-n+1] + ... + P[i]) / n
//! Warmup: first (n-1) points are undefined.

use std::collections::VecDeque;

use crate::domain::indicator::{IndicatorPoint, MovingAverage};
use crate::domain::price::PriceSeries;

/// Running mean over the last `window` values pushed.
#[derive(Debug, Clone)]
pub struct RollingMean {
    window: usize,
    buffer: VecDeque<f64>,
    sum: f64,
}

impl RollingMean {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buffer: VecDeque::with_capacity(window),
            sum: 0.0,
        }
    }

    /// Push a value and return the mean once the window is full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if self.window == 0 {
            return None;
        }
        if self.buffer.len() == self.window {
            if let Some(oldest) = self.buffer.pop_front() {
                self.sum -= oldest;
            }
        }
        self.buffer.push_back(value);
        self.sum += value;

        (self.buffer.len() == self.window).then(|| self.sum / self.window as f64)
    }
}

pub fn calculate_sma(series: &PriceSeries, window: usize) -> MovingAverage {
    let mut rolling = RollingMean::new(window);
    let values = series
        .points()
        .iter()
        .map(|p| IndicatorPoint {
            date: p.date,
            value: rolling.push(p.close),
        })
        .collect();

    MovingAverage { window, values }
}
