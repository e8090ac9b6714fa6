//! Simulation runner: every historical start year, one cohort each
//!
//! Holds the historical series for the duration of a run and replays a
//! cohort from each year that has at least one year of data.

use log::{info, warn};
use rayon::prelude::*;

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::market::HistoricalSeries;
use crate::projection::{CohortResult, CohortSimulator};
use crate::strategy::{GlideConfig, WithdrawalConfig};
use crate::summary::SimulationSummary;

/// Runs cohort simulations over a pre-loaded historical series
///
/// # Example
/// ```ignore
/// let runner = SimulationRunner::new(load_series("returns.csv")?);
/// for rate in [0.03, 0.04, 0.05] {
///     let config = SimulationConfig { withdrawal: WithdrawalConfig::flat(rate), ..Default::default() };
///     let results = runner.run(&config)?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SimulationRunner {
    series: HistoricalSeries,
}

impl SimulationRunner {
    pub fn new(series: HistoricalSeries) -> Self {
        Self { series }
    }

    pub fn series(&self) -> &HistoricalSeries {
        &self.series
    }

    /// One result per start year, ascending. Fails before any cohort runs if
    /// the config is invalid.
    pub fn run(&self, config: &SimulationConfig) -> Result<Vec<CohortResult>> {
        let simulator = CohortSimulator::new(&self.series, config)?;
        let start_years: Vec<i32> = self.series.years().collect();

        info!(
            "simulating {} cohorts over {} years ({})",
            start_years.len(),
            config.horizon_years,
            if config.parallel { "parallel" } else { "sequential" }
        );

        // Indexed collect keeps start-year order in both modes
        let results: Vec<CohortResult> = if config.parallel {
            start_years
                .par_iter()
                .map(|&year| simulator.simulate(year))
                .collect()
        } else {
            start_years.iter().map(|&year| simulator.simulate(year)).collect()
        };

        let truncated = results.iter().filter(|r| r.is_truncated()).count();
        if truncated > 0 {
            warn!(
                "{} of {} cohorts have truncated horizons (data ends {})",
                truncated,
                results.len(),
                self.series.last_year()
            );
        }

        Ok(results)
    }

    /// Run, then reduce to a summary
    pub fn run_with_summary(
        &self,
        config: &SimulationConfig,
    ) -> Result<(Vec<CohortResult>, Option<SimulationSummary>)> {
        let results = self.run(config)?;
        let summary = SimulationSummary::from_results(&results);
        Ok((results, summary))
    }

    /// Run several configurations against the same series
    pub fn run_scenarios(&self, configs: &[SimulationConfig]) -> Result<Vec<Vec<CohortResult>>> {
        configs.iter().map(|config| self.run(config)).collect()
    }
}

/// Run every cohort with the default starting balance
pub fn run(
    series: &HistoricalSeries,
    horizon_years: u32,
    glide: GlideConfig,
    withdrawal: WithdrawalConfig,
) -> Result<Vec<CohortResult>> {
    let config = SimulationConfig::new(horizon_years, glide, withdrawal);
    SimulationRunner::new(series.clone()).run(&config)
}
