//! Safe withdrawal rate search
//!
//! Bisection over the initial withdrawal rate: the safe rate is the largest
//! rate at which every complete-horizon cohort meets the success rule. Once
//! found, a second bisection finds the largest ratchet rate that keeps every
//! cohort successful at that withdrawal rate.

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::error::{ConfigError, Result};
use crate::market::HistoricalSeries;
use crate::projection::CohortSimulator;

/// Bisection stops once the bracket is narrower than this
pub const RATE_TOLERANCE: f64 = 0.00005;

/// Results are rounded down to this many decimal places
const RATE_DECIMALS: i32 = 4;

/// Outcome of the safe-rate search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeRates {
    /// Largest initial withdrawal rate at which every cohort succeeds (0 if none)
    pub withdrawal_rate: f64,

    /// Largest ratchet rate that keeps every cohort successful, if any
    pub ratchet_rate: Option<f64>,

    /// Complete-horizon cohorts tested at each step
    pub cohorts_tested: usize,

    pub withdrawal_iterations: u32,
    pub ratchet_iterations: u32,
}

/// Start years with data for the full horizon
fn complete_start_years(series: &HistoricalSeries, horizon_years: u32) -> Vec<i32> {
    series
        .years()
        .filter(|&year| series.years_available_from(year) >= horizon_years as usize)
        .collect()
}

/// Whether every listed cohort meets the configured success rule
fn all_succeed(
    series: &HistoricalSeries,
    config: &SimulationConfig,
    start_years: &[i32],
) -> Result<bool> {
    let simulator = CohortSimulator::new(series, config)?;
    let rule = config.success_rule;
    let ok = if config.parallel {
        start_years
            .par_iter()
            .all(|&year| simulator.simulate(year).succeeded(rule))
    } else {
        start_years
            .iter()
            .all(|&year| simulator.simulate(year).succeeded(rule))
    };
    Ok(ok)
}

/// Largest value in [0, 1] passing `succeeds`, to within `RATE_TOLERANCE`.
/// Returns the lower bracket and the iteration count.
fn bisect<F>(mut succeeds: F) -> Result<(f64, u32)>
where
    F: FnMut(f64) -> Result<bool>,
{
    let mut low = 0.0;
    let mut high = 1.0;
    let mut iterations = 0;

    while high - low > RATE_TOLERANCE {
        let mid = (low + high) / 2.0;
        if succeeds(mid)? {
            low = mid;
        } else {
            high = mid;
        }
        iterations += 1;
    }

    Ok((low, iterations))
}

fn round_down(rate: f64) -> f64 {
    let scale = 10f64.powi(RATE_DECIMALS);
    (rate * scale).floor() / scale
}

fn prepare(series: &HistoricalSeries, config: &SimulationConfig) -> Result<(SimulationConfig, Vec<i32>)> {
    let mut base = config.clone();
    base.detailed_output = false;
    base.withdrawal.ratchet_rate = None;
    // Any valid rate: only the rest of the config is being checked here
    base.withdrawal.initial_rate = 0.5;
    base.validate()?;

    let start_years = complete_start_years(series, base.horizon_years);
    if start_years.is_empty() {
        return Err(ConfigError::HorizonExceedsData {
            horizon_years: base.horizon_years,
            available_years: series.len(),
        }
        .into());
    }
    Ok((base, start_years))
}

/// Largest initial withdrawal rate at which every complete cohort succeeds
pub fn find_safe_withdrawal_rate(series: &HistoricalSeries, config: &SimulationConfig) -> Result<(f64, u32)> {
    let (mut candidate, start_years) = prepare(series, config)?;

    let (rate, iterations) = bisect(|rate| {
        candidate.withdrawal.initial_rate = rate;
        let ok = all_succeed(series, &candidate, &start_years)?;
        debug!("withdrawal rate {:.6}: {}", rate, if ok { "safe" } else { "fails" });
        Ok(ok)
    })?;

    Ok((round_down(rate), iterations))
}

/// Largest ratchet rate that keeps every complete cohort successful at
/// `withdrawal_rate`; None when no positive ratchet rate is safe
pub fn find_safe_ratchet_rate(
    series: &HistoricalSeries,
    config: &SimulationConfig,
    withdrawal_rate: f64,
) -> Result<(Option<f64>, u32)> {
    let (mut candidate, start_years) = prepare(series, config)?;
    if withdrawal_rate <= 0.0 {
        return Ok((None, 0));
    }
    candidate.withdrawal.initial_rate = withdrawal_rate;

    let (rate, iterations) = bisect(|rate| {
        candidate.withdrawal.ratchet_rate = Some(rate);
        let ok = all_succeed(series, &candidate, &start_years)?;
        debug!("ratchet rate {:.6}: {}", rate, if ok { "safe" } else { "fails" });
        Ok(ok)
    })?;

    let rate = round_down(rate);
    Ok(((rate > 0.0).then_some(rate), iterations))
}

/// Safe withdrawal rate, then the safe ratchet rate at that withdrawal rate
pub fn solve(series: &HistoricalSeries, config: &SimulationConfig) -> Result<SafeRates> {
    let (withdrawal_rate, withdrawal_iterations) = find_safe_withdrawal_rate(series, config)?;
    let (ratchet_rate, ratchet_iterations) =
        find_safe_ratchet_rate(series, config, withdrawal_rate)?;
    let cohorts_tested = complete_start_years(series, config.horizon_years).len();

    info!(
        "safe withdrawal rate {:.4}, safe ratchet rate {:?} over {} cohorts",
        withdrawal_rate, ratchet_rate, cohorts_tested
    );

    Ok(SafeRates {
        withdrawal_rate,
        ratchet_rate,
        cohorts_tested,
        withdrawal_iterations,
        ratchet_iterations,
    })
}
