//! Simulation run configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::strategy::{GlideConfig, WithdrawalConfig};

/// Starting balance used when none is supplied
pub const DEFAULT_INITIAL_BALANCE: f64 = 100_000.0;

/// Default retirement length in years
pub const DEFAULT_HORIZON_YEARS: u32 = 30;

/// Order of growth and withdrawal within a simulated year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalOrder {
    /// Apply the year's return, then withdraw
    #[default]
    GrowthThenWithdraw,
    /// Withdraw first; only the remainder earns the year's return
    WithdrawThenGrowth,
}

/// What counts as a successful cohort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessRule {
    /// The portfolio was never depleted
    #[default]
    Survival,
    /// Never depleted and the real (inflation-adjusted) ending balance is at
    /// least the initial balance
    Preservation,
}

/// Everything a run needs besides the historical series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Years each cohort is simulated for
    pub horizon_years: u32,

    /// Portfolio value at retirement
    pub initial_balance: f64,

    pub glide: GlideConfig,

    pub withdrawal: WithdrawalConfig,

    pub withdrawal_order: WithdrawalOrder,

    pub success_rule: SuccessRule,

    /// Simulate cohorts on the rayon thread pool
    pub parallel: bool,

    /// Keep a per-year trace in every cohort result
    pub detailed_output: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon_years: DEFAULT_HORIZON_YEARS,
            initial_balance: DEFAULT_INITIAL_BALANCE,
            glide: GlideConfig::default(),
            withdrawal: WithdrawalConfig::default(),
            withdrawal_order: WithdrawalOrder::default(),
            success_rule: SuccessRule::default(),
            parallel: false,
            detailed_output: false,
        }
    }
}

impl SimulationConfig {
    pub fn new(horizon_years: u32, glide: GlideConfig, withdrawal: WithdrawalConfig) -> Self {
        Self {
            horizon_years,
            glide,
            withdrawal,
            ..Default::default()
        }
    }

    /// Check every option; nothing is simulated with an invalid config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon_years == 0 {
            return Err(ConfigError::NonPositiveHorizon(self.horizon_years));
        }
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(ConfigError::NonPositiveBalance(self.initial_balance));
        }
        self.glide.validate()?;
        self.withdrawal.validate()?;
        Ok(())
    }

    /// Load a config from a JSON document; omitted fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
