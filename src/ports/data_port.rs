//! Price data access port trait.

use crate::domain::error::GoldenCrossError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

pub trait PricePort {
    /// Daily closes for `ticker` with `start <= date < end`, ascending.
    fn fetch_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, GoldenCrossError>;

    fn list_tickers(&self) -> Result<Vec<String>, GoldenCrossError>;

    /// First date, last date and row count, or `None` when the ticker has no rows.
    fn data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, GoldenCrossError>;
}
