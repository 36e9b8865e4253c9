//! Report generation port trait.

use std::path::PathBuf;

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::GoldenCrossError;

/// Where and how a report is written.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub ticker: String,
    /// Directory for file outputs such as charts.
    pub output_dir: PathBuf,
    pub histogram_bins: usize,
}

impl ReportContext {
    pub fn new(ticker: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            ticker: ticker.into(),
            output_dir: output_dir.into(),
            histogram_bins: 80,
        }
    }
}

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        config: &BacktestConfig,
        ctx: &ReportContext,
    ) -> Result<(), GoldenCrossError>;
}
