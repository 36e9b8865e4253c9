//! CSV file price adapter.
//!
//! One file per ticker, `<base_path>/<TICKER>.csv`, with a header row. The
//! date column is `date`; the close column is the first of `adj_close`,
//! `adj close` or `close`, matched case-insensitively.

use crate::domain::error::GoldenCrossError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::PricePort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const DATE_COLUMN: &str = "date";
const CLOSE_COLUMNS: [&str; 3] = ["adj_close", "adj close", "close"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    /// Every row of the ticker's file, unfiltered and unsorted.
    fn read_points(&self, ticker: &str) -> Result<Vec<PricePoint>, GoldenCrossError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| GoldenCrossError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| GoldenCrossError::Data {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();

        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let date_idx = find(DATE_COLUMN).ok_or_else(|| GoldenCrossError::Data {
            reason: format!("{}: missing date column", path.display()),
        })?;
        let close_idx = CLOSE_COLUMNS
            .iter()
            .find_map(|name| find(name))
            .ok_or_else(|| GoldenCrossError::Data {
                reason: format!("{}: missing close column", path.display()),
            })?;

        let mut points = Vec::new();
        let mut skipped = 0usize;
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| GoldenCrossError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_idx).unwrap_or_default();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                GoldenCrossError::Data {
                    reason: format!("row {}: invalid date '{}': {}", row + 1, date_str, e),
                }
            })?;

            let close_str = record.get(close_idx).unwrap_or_default();
            if close_str.is_empty() {
                skipped += 1;
                continue;
            }
            let close: f64 = close_str.parse().map_err(|e| GoldenCrossError::Data {
                reason: format!("row {}: invalid close '{}': {}", row + 1, close_str, e),
            })?;

            points.push(PricePoint::new(date, close));
        }

        if skipped > 0 {
            tracing::debug!(ticker, skipped, "skipped rows without a close");
        }
        Ok(points)
    }
}

impl PricePort for CsvAdapter {
    fn fetch_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, GoldenCrossError> {
        let mut points: Vec<PricePoint> = self
            .read_points(ticker)?
            .into_iter()
            .filter(|p| p.date >= start && p.date < end)
            .collect();

        if points.is_empty() {
            return Err(GoldenCrossError::NoData {
                ticker: ticker.to_string(),
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        points.sort_by_key(|p| p.date);
        tracing::debug!(ticker, rows = points.len(), "loaded closes");
        PriceSeries::new(points)
    }

    fn list_tickers(&self) -> Result<Vec<String>, GoldenCrossError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| GoldenCrossError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GoldenCrossError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(ticker) = name_str.strip_suffix(".csv") {
                if !ticker.is_empty() {
                    tickers.push(ticker.to_string());
                }
            }
        }

        tickers.sort();
        Ok(tickers)
    }

    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, GoldenCrossError> {
        if !self.csv_path(ticker).exists() {
            return Ok(None);
        }
        let points = self.read_points(ticker)?;
        let first = points.iter().map(|p| p.date).min();
        let last = points.iter().map(|p| p.date).max();
        Ok(first.zip(last).map(|(f, l)| (f, l, points.len())))
    }
}
