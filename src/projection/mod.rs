//! Cohort simulation: portfolio state, the year-by-year engine and its results

mod state;
mod engine;
mod cashflows;

pub use state::PortfolioState;
pub use engine::CohortSimulator;
pub use cashflows::{CohortOutcome, CohortResult, TruncatedHorizonWarning, YearRow};
