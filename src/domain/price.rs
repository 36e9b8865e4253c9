//! Daily closing-price series for a single instrument.
//!
//! A [`PriceSeries`] can only be built through [`PriceSeries::new`], which
//! rejects malformed input. Everything downstream assumes strictly increasing
//! dates and positive, finite closes.

use chrono::NaiveDate;

use super::error::GoldenCrossError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, GoldenCrossError> {
        for (i, point) in points.iter().enumerate() {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(GoldenCrossError::InvalidSeries {
                    index: i,
                    reason: format!("close must be positive and finite, got {}", point.close),
                });
            }
            if i > 0 {
                let prev = points[i - 1].date;
                if point.date == prev {
                    return Err(GoldenCrossError::InvalidSeries {
                        index: i,
                        reason: format!("duplicate date {}", point.date),
                    });
                }
                if point.date < prev {
                    return Err(GoldenCrossError::InvalidSeries {
                        index: i,
                        reason: format!("date {} precedes {}", point.date, prev),
                    });
                }
            }
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn accepts_ordered_positive_series() {
        let series = PriceSeries::new(vec![
            PricePoint::new(day(2), 100.0),
            PricePoint::new(day(3), 101.5),
            PricePoint::new(day(5), 99.0),
        ])
        .unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![100.0, 101.5, 99.0]);
        assert_eq!(series.first_date(), Some(day(2)));
        assert_eq!(series.last_date(), Some(day(5)));
    }

    #[test]
    fn accepts_empty_series() {
        let series = PriceSeries::new(vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.first_date(), None);
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::new(vec![
            PricePoint::new(day(2), 100.0),
            PricePoint::new(day(2), 101.0),
        ])
        .unwrap_err();
        assert!(matches!(err, GoldenCrossError::InvalidSeries { index: 1, .. }));
    }

    #[test]
    fn rejects_out_of_order_dates() {
        let err = PriceSeries::new(vec![
            PricePoint::new(day(3), 100.0),
            PricePoint::new(day(2), 101.0),
        ])
        .unwrap_err();
        assert!(matches!(err, GoldenCrossError::InvalidSeries { index: 1, .. }));
    }

    #[test]
    fn rejects_non_positive_close() {
        let err = PriceSeries::new(vec![
            PricePoint::new(day(2), 100.0),
            PricePoint::new(day(3), 0.0),
        ])
        .unwrap_err();
        assert!(matches!(err, GoldenCrossError::InvalidSeries { index: 1, .. }));

        let err = PriceSeries::new(vec![PricePoint::new(day(2), f64::NAN)]).unwrap_err();
        assert!(matches!(err, GoldenCrossError::InvalidSeries { index: 0, .. }));
    }
}
