//! Immutable annual market history

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Market observations for one calendar year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    /// Calendar year
    pub year: i32,

    /// Equity total return for the year (0.10 = 10%)
    pub equity_return: f64,

    /// Bond total return for the year
    pub bond_return: f64,

    /// Inflation rate for the year
    pub inflation: f64,
}

impl YearRecord {
    pub fn new(year: i32, equity_return: f64, bond_return: f64, inflation: f64) -> Self {
        Self {
            year,
            equity_return,
            bond_return,
            inflation,
        }
    }

    /// Blended portfolio return for a given equity fraction
    pub fn blended_return(&self, equity_fraction: f64) -> f64 {
        equity_fraction * self.equity_return + (1.0 - equity_fraction) * self.bond_return
    }

    fn validate(&self) -> Result<(), DataError> {
        for (field, value) in [
            ("equity_return", self.equity_return),
            ("bond_return", self.bond_return),
            ("inflation", self.inflation),
        ] {
            if !value.is_finite() {
                return Err(DataError::NonFinite { year: self.year, field });
            }
            if value <= -1.0 {
                return Err(DataError::ReturnOutOfRange { year: self.year, field, value });
            }
        }
        Ok(())
    }
}

/// Ordered, gap-free annual history.
///
/// Years are strictly increasing by one, so a calendar year maps to a record
/// by offset from the first year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalSeries {
    records: Vec<YearRecord>,
}

impl HistoricalSeries {
    /// Validate and take ownership of the records
    pub fn new(records: Vec<YearRecord>) -> Result<Self, DataError> {
        if records.is_empty() {
            return Err(DataError::Empty);
        }

        for record in &records {
            record.validate()?;
        }

        // Strict ordering across the whole table first, then gaps
        if let Some(pair) = records.windows(2).find(|p| p[1].year <= p[0].year) {
            return Err(DataError::NonMonotonic {
                previous: pair[0].year,
                year: pair[1].year,
            });
        }
        if let Some(pair) = records.windows(2).find(|p| p[1].year != p[0].year + 1) {
            return Err(DataError::Gap {
                previous: pair[0].year,
                year: pair[1].year,
            });
        }

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_year(&self) -> i32 {
        self.records[0].year
    }

    pub fn last_year(&self) -> i32 {
        self.records[self.records.len() - 1].year
    }

    /// Record for a calendar year, if covered by the series
    pub fn get(&self, year: i32) -> Option<&YearRecord> {
        let offset = year.checked_sub(self.first_year())?;
        usize::try_from(offset).ok().and_then(|i| self.records.get(i))
    }

    /// Number of years of data from `start_year` through the end of the series
    pub fn years_available_from(&self, start_year: i32) -> usize {
        if start_year < self.first_year() || start_year > self.last_year() {
            0
        } else {
            (self.last_year() - start_year + 1) as usize
        }
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.records.iter().map(|r| r.year)
    }

    pub fn records(&self) -> &[YearRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn three_years() -> Vec<YearRecord> {
        vec![
            YearRecord::new(2000, 0.10, 0.02, 0.03),
            YearRecord::new(2001, -0.10, 0.02, 0.03),
            YearRecord::new(2002, 0.10, 0.02, 0.03),
        ]
    }

    #[test]
    fn test_lookup_by_calendar_year() {
        let series = HistoricalSeries::new(three_years()).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.first_year(), 2000);
        assert_eq!(series.last_year(), 2002);
        assert_eq!(series.get(2001).unwrap().equity_return, -0.10);
        assert!(series.get(1999).is_none());
        assert!(series.get(2003).is_none());
    }

    #[test]
    fn test_years_available() {
        let series = HistoricalSeries::new(three_years()).unwrap();
        assert_eq!(series.years_available_from(2000), 3);
        assert_eq!(series.years_available_from(2002), 1);
        assert_eq!(series.years_available_from(2003), 0);
        assert_eq!(series.years_available_from(1990), 0);
    }

    #[test]
    fn test_blended_return() {
        let record = YearRecord::new(2000, 0.10, 0.02, 0.03);
        assert_abs_diff_eq!(record.blended_return(0.6), 0.068, epsilon = 1e-12);
        assert_abs_diff_eq!(record.blended_return(0.0), 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(record.blended_return(1.0), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(HistoricalSeries::new(vec![]), Err(DataError::Empty));
    }

    #[test]
    fn test_rejects_non_monotonic_years() {
        let mut records = three_years();
        records.swap(1, 2);
        assert_eq!(
            HistoricalSeries::new(records),
            Err(DataError::NonMonotonic { previous: 2002, year: 2001 })
        );
    }

    #[test]
    fn test_gap_reported_only_for_ordered_tables() {
        let records = vec![
            YearRecord::new(2000, 0.10, 0.02, 0.03),
            YearRecord::new(2002, 0.10, 0.02, 0.03),
            YearRecord::new(2003, 0.10, 0.02, 0.03),
            YearRecord::new(2001, 0.10, 0.02, 0.03),
        ];
        assert_eq!(
            HistoricalSeries::new(records),
            Err(DataError::NonMonotonic { previous: 2003, year: 2001 })
        );
    }

    #[test]
    fn test_rejects_duplicate_year() {
        let mut records = three_years();
        records[1].year = 2000;
        assert!(matches!(
            HistoricalSeries::new(records),
            Err(DataError::NonMonotonic { .. })
        ));
    }

    #[test]
    fn test_rejects_gap() {
        let mut records = three_years();
        records.remove(1);
        assert_eq!(
            HistoricalSeries::new(records),
            Err(DataError::Gap { previous: 2000, year: 2002 })
        );
    }

    #[test]
    fn test_rejects_non_finite_and_total_loss() {
        let mut records = three_years();
        records[0].inflation = f64::NAN;
        assert_eq!(
            HistoricalSeries::new(records),
            Err(DataError::NonFinite { year: 2000, field: "inflation" })
        );

        let mut records = three_years();
        records[2].equity_return = -1.0;
        assert!(matches!(
            HistoricalSeries::new(records),
            Err(DataError::ReturnOutOfRange { year: 2002, field: "equity_return", .. })
        ));
    }
}
