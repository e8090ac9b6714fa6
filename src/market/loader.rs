//! Load annual market history from CSV
//!
//! Expected header: `year,equity_return,bond_return,inflation` with an
//! optional `dividend_yield` column. All rates are decimals (0.05 = 5%).

use csv::Reader;
use log::{debug, info};
use std::path::Path;

use super::{HistoricalSeries, YearRecord};
use crate::error::{DataError, Result};

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    year: i32,
    equity_return: f64,
    bond_return: f64,
    inflation: f64,
    #[serde(default)]
    dividend_yield: Option<f64>,
}

impl CsvRow {
    fn to_record(&self, line: u64) -> std::result::Result<YearRecord, DataError> {
        // Range-check raw columns; two losses past -100% compound to a gain
        let raw = [
            ("equity_return", Some(self.equity_return)),
            ("dividend_yield", self.dividend_yield),
        ];
        for (field, value) in raw {
            if let Some(value) = value {
                if !value.is_finite() || value <= -1.0 {
                    return Err(DataError::MalformedRow {
                        line,
                        message: format!(
                            "{} of {} must be finite and greater than -1",
                            field, value
                        ),
                    });
                }
            }
        }

        // Price return plus dividends compounds into a total return
        let equity_return = match self.dividend_yield {
            Some(dividend) => (1.0 + self.equity_return) * (1.0 + dividend) - 1.0,
            None => self.equity_return,
        };
        Ok(YearRecord::new(self.year, equity_return, self.bond_return, self.inflation))
    }
}

fn malformed(err: csv::Error) -> DataError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    DataError::MalformedRow {
        line,
        message: err.to_string(),
    }
}

fn read_series<R: std::io::Read>(mut reader: Reader<R>) -> Result<HistoricalSeries> {
    let headers = reader.headers().map_err(malformed)?.clone();
    let mut records = Vec::new();

    for result in reader.records() {
        let record = result.map_err(malformed)?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row: CsvRow = record
            .deserialize(Some(&headers))
            .map_err(|err| DataError::MalformedRow {
                line,
                message: err.to_string(),
            })?;
        records.push(row.to_record(line)?);
    }
    debug!("parsed {} market rows", records.len());

    let series = HistoricalSeries::new(records)?;
    info!(
        "loaded historical series {}-{} ({} years)",
        series.first_year(),
        series.last_year(),
        series.len()
    );
    Ok(series)
}

/// Load a historical series from a CSV file
pub fn load_series<P: AsRef<Path>>(path: P) -> Result<HistoricalSeries> {
    let reader = Reader::from_path(path)?;
    read_series(reader)
}

/// Load a historical series from any reader (e.g., string buffer)
pub fn load_series_from_reader<R: std::io::Read>(reader: R) -> Result<HistoricalSeries> {
    read_series(Reader::from_reader(reader))
}
