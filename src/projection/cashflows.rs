//! Per-cohort output structures

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SuccessRule;

/// One simulated year of a cohort (kept only with `detailed_output`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRow {
    pub year_index: u32,
    pub calendar_year: i32,
    pub start_balance: f64,
    pub equity_allocation: f64,
    pub portfolio_return: f64,
    pub withdrawal: f64,
    pub end_balance: f64,
    pub inflation_factor: f64,
    pub real_end_balance: f64,
    pub depleted: bool,
}

/// Historical data ran out before the cohort's horizon completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncatedHorizonWarning {
    pub start_year: i32,
    pub requested_years: u32,
    pub available_years: u32,
}

impl fmt::Display for TruncatedHorizonWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cohort {} truncated: {} of {} years of data available",
            self.start_year, self.available_years, self.requested_years
        )
    }
}

/// How a cohort ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortOutcome {
    /// Balance stayed positive for the full horizon
    Survived,
    /// Balance stayed positive, but data covered only part of the horizon
    SurvivedTruncated { years_covered: u32 },
    /// Balance hit zero in the given calendar year
    Depleted { year: i32 },
}

/// Result of simulating one retirement start year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortResult {
    /// Calendar year of retirement
    pub start_year: i32,

    /// Balance stayed positive through every simulated year
    pub survived: bool,

    /// Calendar year the balance hit zero
    pub depletion_year: Option<i32>,

    /// Nominal balance after the last simulated year
    pub ending_balance: f64,

    /// Ending balance in retirement-start dollars
    pub ending_real_balance: f64,

    /// Years actually simulated (less than the horizon when truncated)
    pub years_simulated: u32,

    /// Set when the data did not cover the full horizon
    pub truncation: Option<TruncatedHorizonWarning>,

    /// Survived with the real ending balance at or above the initial balance
    pub preserved: bool,

    /// Spending raises applied by the ratchet rule
    pub raises: u32,

    /// Nominal amount actually paid out
    pub total_withdrawals: f64,

    /// Per-year trace; empty unless detailed output was requested
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub years: Vec<YearRow>,
}

impl CohortResult {
    pub fn is_truncated(&self) -> bool {
        self.truncation.is_some()
    }

    /// Survived the entire requested horizon on real data
    pub fn survived_full_horizon(&self) -> bool {
        self.survived && !self.is_truncated()
    }

    /// A cohort's fate is known if it ran the full horizon or depleted
    pub fn is_determined(&self) -> bool {
        !self.is_truncated() || !self.survived
    }

    pub fn outcome(&self) -> CohortOutcome {
        match (self.depletion_year, self.truncation) {
            (Some(year), _) => CohortOutcome::Depleted { year },
            (None, Some(warning)) => CohortOutcome::SurvivedTruncated {
                years_covered: warning.available_years,
            },
            (None, None) => CohortOutcome::Survived,
        }
    }

    /// Whether the cohort met the given success rule
    pub fn succeeded(&self, rule: SuccessRule) -> bool {
        match rule {
            SuccessRule::Survival => self.survived,
            SuccessRule::Preservation => self.preserved,
        }
    }
}
