//! Equity glide path: equity allocation as a function of years in retirement

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Linear glide from `start_equity_pct` to `end_equity_pct` over
/// `transition_years`, holding the end allocation afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlideConfig {
    /// Equity fraction in the first year of retirement
    pub start_equity_pct: f64,

    /// Equity fraction once the transition completes
    pub end_equity_pct: f64,

    /// Years over which to move from start to end (0 = step to end immediately)
    pub transition_years: u32,
}

impl GlideConfig {
    /// Constant allocation for the whole horizon
    pub fn fixed(equity_pct: f64) -> Self {
        Self {
            start_equity_pct: equity_pct,
            end_equity_pct: equity_pct,
            transition_years: 0,
        }
    }

    pub fn linear(start_equity_pct: f64, end_equity_pct: f64, transition_years: u32) -> Self {
        Self {
            start_equity_pct,
            end_equity_pct,
            transition_years,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("start_equity_pct", self.start_equity_pct),
            ("end_equity_pct", self.end_equity_pct),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::PercentOutOfRange { field, value });
            }
        }
        Ok(())
    }

    /// Equity fraction for the given year of retirement (0-indexed)
    pub fn allocation(&self, years_since_retirement: u32) -> f64 {
        allocation(years_since_retirement, self)
    }
}

impl Default for GlideConfig {
    fn default() -> Self {
        Self::fixed(0.6)
    }
}

/// Equity fraction in [0, 1]; bonds hold the remainder.
pub fn allocation(years_since_retirement: u32, config: &GlideConfig) -> f64 {
    let equity = if years_since_retirement >= config.transition_years {
        config.end_equity_pct
    } else {
        let progress = years_since_retirement as f64 / config.transition_years as f64;
        config.start_equity_pct + (config.end_equity_pct - config.start_equity_pct) * progress
    };
    equity.clamp(0.0, 1.0)
}
