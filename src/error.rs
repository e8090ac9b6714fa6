//! Error types for configuration, historical data and CSV failures

use thiserror::Error;

/// Result type alias for simulator operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Invalid simulation configuration, detected before any cohort runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Equity percentage outside [0, 1] (or not finite).
    #[error("{field} must be in [0, 1], got {value}")]
    PercentOutOfRange { field: &'static str, value: f64 },

    /// Horizon must cover at least one year.
    #[error("horizon_years must be positive, got {0}")]
    NonPositiveHorizon(u32),

    /// Withdrawal rate outside (0, 1].
    #[error("{field} must be in (0, 1], got {value}")]
    RateOutOfRange { field: &'static str, value: f64 },

    /// Starting balance must be a positive finite amount.
    #[error("initial_balance must be positive, got {0}")]
    NonPositiveBalance(f64),

    /// Requested percentile outside [0, 100].
    #[error("percentile must be in [0, 100], got {0}")]
    PercentileOutOfRange(u32),

    /// No start year has enough data for a complete horizon.
    #[error("horizon of {horizon_years} years exceeds the {available_years} years of data")]
    HorizonExceedsData {
        horizon_years: u32,
        available_years: usize,
    },
}

/// Malformed historical series, detected at load time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("historical series is empty")]
    Empty,

    #[error("years must be strictly increasing: {previous} followed by {year}")]
    NonMonotonic { previous: i32, year: i32 },

    #[error("gap in historical series between {previous} and {year}")]
    Gap { previous: i32, year: i32 },

    #[error("non-finite {field} in year {year}")]
    NonFinite { year: i32, field: &'static str },

    /// A return or inflation rate of -100% or worse.
    #[error("{field} of {value} in year {year} must be greater than -1")]
    ReturnOutOfRange {
        year: i32,
        field: &'static str,
        value: f64,
    },

    #[error("malformed row at line {line}: {message}")]
    MalformedRow { line: u64, message: String },
}

/// Top-level error for library entry points.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
