//! Outcome distribution across cohorts
//!
//! Pure reduction over a run's cohort results. Rates and percentiles cover the
//! *determined* cohorts only: those that ran the full horizon plus truncated
//! cohorts that depleted within their window. A truncated survivor's outcome
//! is unknown and is counted separately.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::projection::CohortResult;

/// Percentiles reported by default
pub const DEFAULT_PERCENTILES: [u32; 5] = [10, 25, 50, 75, 90];

/// Summary statistics for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    /// All cohorts in the run
    pub cohorts: usize,
    /// Cohorts with data for the full horizon
    pub complete_cohorts: usize,
    /// Cohorts whose data ran out before the horizon
    pub truncated_cohorts: usize,
    /// Cohorts that hit zero (truncated or not)
    pub depleted_cohorts: usize,
    /// Fraction of determined cohorts that survived
    pub survival_rate: f64,
    /// Fraction of determined cohorts that preserved their real starting balance
    pub preservation_rate: f64,
    /// Start year with the worst outcome
    pub worst_start_year: i32,
    /// Start year with the best outcome
    pub best_start_year: i32,
    pub median_ending_real_balance: f64,
    /// Nominal ending balance by percentile
    pub percentile_ending_balance: BTreeMap<u32, f64>,
}

impl SimulationSummary {
    /// Summarize with the default percentiles; None if no cohort is determined
    pub fn from_results(results: &[CohortResult]) -> Option<Self> {
        summarize(results, &DEFAULT_PERCENTILES).ok().flatten()
    }
}

/// Reduce cohort results to a summary with the requested percentiles
pub fn summarize(
    results: &[CohortResult],
    percentiles: &[u32],
) -> Result<Option<SimulationSummary>, ConfigError> {
    if let Some(&bad) = percentiles.iter().find(|&&p| p > 100) {
        return Err(ConfigError::PercentileOutOfRange(bad));
    }

    let determined: Vec<&CohortResult> = results.iter().filter(|r| r.is_determined()).collect();
    if determined.is_empty() {
        return Ok(None);
    }

    let n = determined.len() as f64;
    let survived = determined.iter().filter(|r| r.survived).count() as f64;
    let preserved = determined.iter().filter(|r| r.preserved).count() as f64;

    // Results arrive in start-year order, so min_by/max_by ties resolve to
    // the earliest year for worst and the latest for best
    let worst = determined
        .iter()
        .min_by(|a, b| compare_outcomes(a, b))
        .map(|r| r.start_year)
        .unwrap_or_default();
    let best = determined
        .iter()
        .max_by(|a, b| compare_outcomes(a, b))
        .map(|r| r.start_year)
        .unwrap_or_default();

    let mut ending: Vec<f64> = determined.iter().map(|r| r.ending_balance).collect();
    let percentile_ending_balance = percentiles
        .iter()
        .map(|&p| (p, percentile(&mut ending, p as f64)))
        .collect();

    let mut real: Vec<f64> = determined.iter().map(|r| r.ending_real_balance).collect();

    Ok(Some(SimulationSummary {
        cohorts: results.len(),
        complete_cohorts: results.iter().filter(|r| !r.is_truncated()).count(),
        truncated_cohorts: results.iter().filter(|r| r.is_truncated()).count(),
        depleted_cohorts: results.iter().filter(|r| !r.survived).count(),
        survival_rate: survived / n,
        preservation_rate: preserved / n,
        worst_start_year: worst,
        best_start_year: best,
        median_ending_real_balance: percentile(&mut real, 50.0),
        percentile_ending_balance,
    }))
}

/// Depleted cohorts rank below survivors; earlier depletion is worse;
/// among survivors a lower real ending balance is worse.
fn compare_outcomes(a: &CohortResult, b: &CohortResult) -> Ordering {
    match (a.depletion_year, b.depletion_year) {
        (Some(ya), Some(yb)) => {
            let years_a = ya - a.start_year;
            let years_b = yb - b.start_year;
            years_a.cmp(&years_b)
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.ending_real_balance.total_cmp(&b.ending_real_balance),
    }
}

/// Linear interpolation between closest ranks; `p` in [0, 100]
pub fn percentile(values: &mut [f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}
