//! Cohort Sim - historical-sequence simulation of retirement withdrawals
//!
//! This library provides:
//! - Validated annual market history (equity, bond, inflation) with a CSV loader
//! - Glide-path equity allocation and flat or inflation-adjusted withdrawal rules
//! - Year-by-year cohort simulation from every historical start year
//! - Outcome distribution summaries (survival, worst start year, percentiles)
//! - Safe withdrawal rate search

pub mod error;
pub mod market;
pub mod strategy;
pub mod config;
pub mod projection;
pub mod scenario;
pub mod summary;
pub mod solver;

// Re-export commonly used types
pub use error::{ConfigError, DataError, Result, SimError};
pub use market::{load_series, load_series_from_reader, HistoricalSeries, YearRecord};
pub use strategy::{GlideConfig, WithdrawalConfig, WithdrawalRule};
pub use config::{SimulationConfig, SuccessRule, WithdrawalOrder};
pub use projection::{CohortOutcome, CohortResult, CohortSimulator, PortfolioState, TruncatedHorizonWarning};
pub use scenario::SimulationRunner;
pub use summary::SimulationSummary;
