//! Withdrawal rules: how much is taken from the portfolio each year

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Withdrawal configuration as supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalConfig {
    /// Year-1 withdrawal as a fraction of the initial balance
    pub initial_rate: f64,

    /// Grow the withdrawal with each year's inflation; otherwise hold it flat in nominal terms
    pub inflation_adjusted: bool,

    /// Raise spending to this fraction of the balance whenever the current
    /// withdrawal falls below it (resets the glide path). None disables raises.
    #[serde(default)]
    pub ratchet_rate: Option<f64>,
}

impl WithdrawalConfig {
    pub fn flat(initial_rate: f64) -> Self {
        Self {
            initial_rate,
            inflation_adjusted: false,
            ratchet_rate: None,
        }
    }

    pub fn inflation_adjusted(initial_rate: f64) -> Self {
        Self {
            initial_rate,
            inflation_adjusted: true,
            ratchet_rate: None,
        }
    }

    pub fn with_ratchet(mut self, ratchet_rate: f64) -> Self {
        self.ratchet_rate = Some(ratchet_rate);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("initial_rate", self.initial_rate)?;
        if let Some(rate) = self.ratchet_rate {
            check_rate("ratchet_rate", rate)?;
        }
        Ok(())
    }

    pub fn rule(&self) -> WithdrawalRule {
        WithdrawalRule::from_config(self)
    }
}

impl Default for WithdrawalConfig {
    fn default() -> Self {
        Self::inflation_adjusted(0.04)
    }
}

fn check_rate(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::RateOutOfRange { field, value })
    }
}

/// Closed set of withdrawal strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WithdrawalRule {
    /// Same nominal amount every year
    Flat { initial_rate: f64 },
    /// Prior year's amount grown by this year's inflation
    InflationAdjusted { initial_rate: f64 },
}

impl WithdrawalRule {
    pub fn from_config(config: &WithdrawalConfig) -> Self {
        if config.inflation_adjusted {
            WithdrawalRule::InflationAdjusted { initial_rate: config.initial_rate }
        } else {
            WithdrawalRule::Flat { initial_rate: config.initial_rate }
        }
    }

    /// Nominal amount for `year_index` (0 = first year of retirement).
    ///
    /// Not clamped to the available balance; the simulator records depletion instead.
    pub fn amount(
        &self,
        year_index: u32,
        initial_balance: f64,
        prior_withdrawal: Option<f64>,
        inflation_this_year: f64,
    ) -> f64 {
        let amount = match *self {
            WithdrawalRule::Flat { initial_rate } => initial_rate * initial_balance,
            WithdrawalRule::InflationAdjusted { initial_rate } => {
                let first_year = initial_rate * initial_balance;
                match prior_withdrawal {
                    Some(prior) if year_index > 0 => prior * (1.0 + inflation_this_year),
                    _ => first_year,
                }
            }
        };
        amount.max(0.0)
    }
}

/// Withdrawal for one year under the given configuration
pub fn withdrawal(
    year_index: u32,
    initial_balance: f64,
    prior_withdrawal: Option<f64>,
    inflation_this_year: f64,
    config: &WithdrawalConfig,
) -> f64 {
    config
        .rule()
        .amount(year_index, initial_balance, prior_withdrawal, inflation_this_year)
}
