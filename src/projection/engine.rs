//! Cohort simulator: replays one historical retirement year by year

use log::{debug, trace};

use super::cashflows::{CohortResult, TruncatedHorizonWarning, YearRow};
use super::state::PortfolioState;
use crate::config::{SimulationConfig, WithdrawalOrder};
use crate::error::ConfigError;
use crate::market::{HistoricalSeries, YearRecord};
use crate::strategy::WithdrawalRule;

/// Simulates retirement cohorts against a shared historical series
#[derive(Debug, Clone, Copy)]
pub struct CohortSimulator<'a> {
    series: &'a HistoricalSeries,
    config: &'a SimulationConfig,
    rule: WithdrawalRule,
}

impl<'a> CohortSimulator<'a> {
    /// Validates the configuration up front so no cohort runs with bad inputs
    pub fn new(
        series: &'a HistoricalSeries,
        config: &'a SimulationConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            series,
            config,
            rule: config.withdrawal.rule(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        self.config
    }

    /// Run one cohort retiring at the start of `start_year`
    pub fn simulate(&self, start_year: i32) -> CohortResult {
        let horizon = self.config.horizon_years;
        let available = self.series.years_available_from(start_year);
        let years_to_run = horizon.min(u32::try_from(available).unwrap_or(u32::MAX));

        let mut state = PortfolioState::new(self.config.initial_balance);
        let mut rows = Vec::new();

        for t in 0..years_to_run {
            let calendar_year = start_year + t as i32;
            let Some(record) = self.series.get(calendar_year) else {
                break;
            };

            let row = self.simulate_year(&mut state, record);
            if self.config.detailed_output {
                rows.push(row);
            }
        }

        let truncation = (years_to_run < horizon).then(|| TruncatedHorizonWarning {
            start_year,
            requested_years: horizon,
            available_years: years_to_run,
        });

        let ending_real_balance = state.real_balance();
        let result = CohortResult {
            start_year,
            survived: !state.depleted,
            depletion_year: state.depletion_year,
            ending_balance: state.balance,
            ending_real_balance,
            years_simulated: state.year_index,
            truncation,
            preserved: !state.depleted && ending_real_balance >= self.config.initial_balance,
            raises: state.raises,
            total_withdrawals: state.total_withdrawn,
            years: rows,
        };

        debug!(
            "cohort {}: survived={} depletion={:?} ending={:.2} truncated={}",
            start_year,
            result.survived,
            result.depletion_year,
            result.ending_balance,
            result.is_truncated()
        );
        result
    }

    /// Advance the state through one calendar year
    fn simulate_year(&self, state: &mut PortfolioState, record: &YearRecord) -> YearRow {
        let start_balance = state.balance;
        let equity_allocation = self.config.glide.allocation(state.glide_years());
        let portfolio_return = record.blended_return(equity_allocation);
        let mut withdrawal = 0.0;

        if !state.depleted {
            withdrawal = self.withdrawal_amount(state, record.inflation);

            match self.config.withdrawal_order {
                WithdrawalOrder::GrowthThenWithdraw => {
                    state.apply_growth(portfolio_return);
                    state.withdraw(withdrawal);
                    state.settle(record.year);
                }
                WithdrawalOrder::WithdrawThenGrowth => {
                    state.withdraw(withdrawal);
                    state.settle(record.year);
                    state.apply_growth(portfolio_return);
                }
            }

            if !state.depleted {
                self.maybe_raise_spending(state, withdrawal);
            }
        }

        state.advance_year(record.inflation);
        trace!(
            "{}: equity={:.3} return={:.4} withdrawal={:.2} balance={:.2}",
            record.year,
            equity_allocation,
            portfolio_return,
            withdrawal,
            state.balance
        );

        YearRow {
            year_index: state.year_index - 1,
            calendar_year: record.year,
            start_balance,
            equity_allocation,
            portfolio_return,
            withdrawal,
            end_balance: state.balance,
            inflation_factor: state.inflation_factor,
            real_end_balance: state.real_balance(),
            depleted: state.depleted,
        }
    }

    fn withdrawal_amount(&self, state: &PortfolioState, inflation: f64) -> f64 {
        let amount = self.rule.amount(
            state.year_index,
            self.config.initial_balance,
            state.prior_withdrawal,
            inflation,
        );
        match state.raised_withdrawal {
            Some(level) => amount.max(level),
            None => amount,
        }
    }

    /// Raise spending when the withdrawal has fallen below the ratchet rate
    fn maybe_raise_spending(&self, state: &mut PortfolioState, withdrawal: f64) {
        let Some(rate) = self.config.withdrawal.ratchet_rate else {
            return;
        };
        let level = rate * state.balance;
        if withdrawal < level {
            state.raise_spending(level, self.config.withdrawal.inflation_adjusted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::CohortOutcome;
    use crate::strategy::{GlideConfig, WithdrawalConfig};
    use approx::assert_abs_diff_eq;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn scenario_series() -> HistoricalSeries {
        HistoricalSeries::new(vec![
            YearRecord::new(2000, 0.10, 0.02, 0.03),
            YearRecord::new(2001, -0.10, 0.02, 0.03),
            YearRecord::new(2002, 0.10, 0.02, 0.03),
        ])
        .unwrap()
    }

    fn flat_series(years: i32, equity: f64, bond: f64, inflation: f64) -> HistoricalSeries {
        HistoricalSeries::new(
            (0..years)
                .map(|i| YearRecord::new(1950 + i, equity, bond, inflation))
                .collect(),
        )
        .unwrap()
    }

    fn scenario_config() -> SimulationConfig {
        SimulationConfig {
            horizon_years: 3,
            initial_balance: 1000.0,
            glide: GlideConfig::fixed(0.6),
            withdrawal: WithdrawalConfig::flat(0.04),
            detailed_output: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_hand_computed_growth_then_withdraw() {
        let series = scenario_series();
        let config = scenario_config();
        let sim = CohortSimulator::new(&series, &config).unwrap();
        let result = sim.simulate(2000);

        let y0 = 1000.0 * 1.068 - 40.0;
        let y1 = y0 * (1.0 + 0.6 * -0.10 + 0.4 * 0.02) - 40.0;
        let y2 = y1 * 1.068 - 40.0;
        assert_abs_diff_eq!(y0, 1028.0, epsilon = 1e-9);

        let balances: Vec<f64> = result.years.iter().map(|r| r.end_balance).collect();
        assert_eq!(balances.len(), 3);
        assert_abs_diff_eq!(balances[0], y0, epsilon = 1e-9);
        assert_abs_diff_eq!(balances[1], y1, epsilon = 1e-9);
        assert_abs_diff_eq!(balances[2], y2, epsilon = 1e-9);

        assert!(result.survived);
        assert!(result.survived_full_horizon());
        assert_eq!(result.depletion_year, None);
        assert_abs_diff_eq!(result.ending_balance, 958.092992, epsilon = 1e-6);
        assert_abs_diff_eq!(
            result.ending_real_balance,
            y2 / 1.03f64.powi(3),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(result.total_withdrawals, 120.0, epsilon = 1e-9);
        assert_eq!(result.years_simulated, 3);
        assert!(!result.preserved);
    }

    #[test]
    fn test_hand_computed_withdraw_then_growth() {
        let series = scenario_series();
        let config = SimulationConfig {
            withdrawal_order: WithdrawalOrder::WithdrawThenGrowth,
            ..scenario_config()
        };
        let result = CohortSimulator::new(&series, &config).unwrap().simulate(2000);

        let y0 = (1000.0 - 40.0) * 1.068;
        let y1 = (y0 - 40.0) * 0.948;
        let y2 = (y1 - 40.0) * 1.068;
        assert_abs_diff_eq!(result.ending_balance, y2, epsilon = 1e-9);

        // Withdrawing first leaves less capital to earn the positive first year
        let growth_first = CohortSimulator::new(&series, &scenario_config())
            .unwrap()
            .simulate(2000);
        assert!(result.ending_balance < growth_first.ending_balance);
    }

    #[test]
    fn test_full_withdrawal_depletes_in_first_year() {
        let series = flat_series(5, 0.0, 0.0, 0.0);
        let config = SimulationConfig {
            horizon_years: 5,
            initial_balance: 1000.0,
            glide: GlideConfig::fixed(0.5),
            withdrawal: WithdrawalConfig::flat(1.0),
            detailed_output: true,
            ..Default::default()
        };
        let result = CohortSimulator::new(&series, &config).unwrap().simulate(1950);

        assert!(!result.survived);
        assert_eq!(result.depletion_year, Some(1950));
        assert_eq!(result.outcome(), CohortOutcome::Depleted { year: 1950 });
        assert_eq!(result.ending_balance, 0.0);
        assert!(result.years.iter().all(|r| r.end_balance == 0.0 && r.depleted));
        // Nothing further is withdrawn once depleted
        assert!(result.years[1..].iter().all(|r| r.withdrawal == 0.0));
        assert_abs_diff_eq!(result.total_withdrawals, 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_truncated_horizon_is_flagged() {
        let series = flat_series(5, 0.05, 0.03, 0.02);
        let config = SimulationConfig {
            horizon_years: 10,
            ..Default::default()
        };
        let result = CohortSimulator::new(&series, &config).unwrap().simulate(1950);

        assert!(result.survived);
        assert!(!result.survived_full_horizon());
        assert_eq!(result.years_simulated, 5);
        assert_eq!(
            result.truncation,
            Some(TruncatedHorizonWarning {
                start_year: 1950,
                requested_years: 10,
                available_years: 5,
            })
        );
        assert_eq!(result.outcome(), CohortOutcome::SurvivedTruncated { years_covered: 5 });
    }

    #[test]
    fn test_inflation_adjusted_withdrawals_track_prices() {
        let series = flat_series(3, 0.0, 0.0, 0.10);
        let config = SimulationConfig {
            horizon_years: 3,
            initial_balance: 1000.0,
            withdrawal: WithdrawalConfig::inflation_adjusted(0.05),
            detailed_output: true,
            ..Default::default()
        };
        let result = CohortSimulator::new(&series, &config).unwrap().simulate(1950);
        let withdrawals: Vec<f64> = result.years.iter().map(|r| r.withdrawal).collect();
        assert_abs_diff_eq!(withdrawals[0], 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(withdrawals[1], 55.0, epsilon = 1e-9);
        assert_abs_diff_eq!(withdrawals[2], 60.5, epsilon = 1e-9);
        assert_abs_diff_eq!(result.ending_balance, 1000.0 - 165.5, epsilon = 1e-9);
    }

    #[test]
    fn test_glide_path_drives_allocation() {
        let series = flat_series(4, 0.10, 0.0, 0.0);
        let config = SimulationConfig {
            horizon_years: 4,
            glide: GlideConfig::linear(1.0, 0.0, 2),
            detailed_output: true,
            ..Default::default()
        };
        let result = CohortSimulator::new(&series, &config).unwrap().simulate(1950);
        let allocations: Vec<f64> = result.years.iter().map(|r| r.equity_allocation).collect();
        assert_eq!(allocations, vec![1.0, 0.5, 0.0, 0.0]);
        assert_abs_diff_eq!(result.years[1].portfolio_return, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_ratchet_raises_spending_and_resets_glide() {
        let series = flat_series(3, 0.20, 0.20, 0.0);
        let config = SimulationConfig {
            horizon_years: 3,
            initial_balance: 1000.0,
            glide: GlideConfig::linear(0.6, 1.0, 2),
            withdrawal: WithdrawalConfig::flat(0.04).with_ratchet(0.05),
            detailed_output: true,
            ..Default::default()
        };
        let result = CohortSimulator::new(&series, &config).unwrap().simulate(1950);

        // Year 0: 1000 * 1.2 - 40 = 1160; 40 < 58 so spending rises to 58
        // Year 1: 1160 * 1.2 - 58 = 1334; 58 < 66.7 so spending rises to 66.7
        // Year 2: 1334 * 1.2 - 66.7 = 1534.1; 66.7 < 76.705 so a third raise
        let withdrawals: Vec<f64> = result.years.iter().map(|r| r.withdrawal).collect();
        let balances: Vec<f64> = result.years.iter().map(|r| r.end_balance).collect();
        assert_abs_diff_eq!(withdrawals[0], 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(withdrawals[1], 58.0, epsilon = 1e-9);
        assert_abs_diff_eq!(withdrawals[2], 66.7, epsilon = 1e-9);
        assert_abs_diff_eq!(balances[0], 1160.0, epsilon = 1e-9);
        assert_abs_diff_eq!(balances[1], 1334.0, epsilon = 1e-9);
        assert_abs_diff_eq!(balances[2], 1534.1, epsilon = 1e-9);
        assert_eq!(result.raises, 3);
        // Every year follows a raise or retirement, so the glide never leaves its start
        assert!(result.years.iter().all(|r| r.equity_allocation == 0.6));
    }

    #[test]
    fn test_ratchet_carries_into_inflation_adjusted_chain() {
        let series = flat_series(2, 0.0, 0.0, 0.10);
        let config = SimulationConfig {
            horizon_years: 2,
            initial_balance: 1000.0,
            withdrawal: WithdrawalConfig::inflation_adjusted(0.02).with_ratchet(0.03),
            detailed_output: true,
            ..Default::default()
        };
        let result = CohortSimulator::new(&series, &config).unwrap().simulate(1950);
        // 1000 - 20 = 980; raised to 0.03 * 980 = 29.4, then inflated by 10%
        assert_abs_diff_eq!(result.years[1].withdrawal, 29.4 * 1.1, epsilon = 1e-9);
        assert_eq!(result.raises, 1);
    }

    #[test]
    fn test_preservation_flag() {
        let series = flat_series(10, 0.08, 0.08, 0.02);
        let config = SimulationConfig {
            horizon_years: 10,
            withdrawal: WithdrawalConfig::inflation_adjusted(0.03),
            ..Default::default()
        };
        let result = CohortSimulator::new(&series, &config).unwrap().simulate(1950);
        assert!(result.preserved);
        assert!(result.ending_real_balance >= config.initial_balance);
    }

    #[test]
    fn test_invalid_config_rejected_before_simulation() {
        let series = scenario_series();
        let config = SimulationConfig {
            glide: GlideConfig::linear(1.5, 0.5, 3),
            ..Default::default()
        };
        assert!(matches!(
            CohortSimulator::new(&series, &config),
            Err(ConfigError::PercentOutOfRange { .. })
        ));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_balance_never_negative_and_depletion_permanent(
            returns in proptest::collection::vec((-0.5f64..0.6, -0.2f64..0.3, -0.05f64..0.15), 1..40),
            rate_bp in 1u32..=10_000,
            equity_bp in 0u32..=10_000,
            adjusted in proptest::bool::ANY,
            withdraw_first in proptest::bool::ANY,
        ) {
            let records: Vec<YearRecord> = returns
                .iter()
                .enumerate()
                .map(|(i, &(e, b, inf))| YearRecord::new(1900 + i as i32, e, b, inf))
                .collect();
            let series = HistoricalSeries::new(records).unwrap();
            let config = SimulationConfig {
                horizon_years: series.len() as u32,
                glide: GlideConfig::fixed(equity_bp as f64 / 10_000.0),
                withdrawal: WithdrawalConfig {
                    initial_rate: rate_bp as f64 / 10_000.0,
                    inflation_adjusted: adjusted,
                    ratchet_rate: None,
                },
                withdrawal_order: if withdraw_first {
                    WithdrawalOrder::WithdrawThenGrowth
                } else {
                    WithdrawalOrder::GrowthThenWithdraw
                },
                detailed_output: true,
                ..Default::default()
            };
            let result = CohortSimulator::new(&series, &config).unwrap().simulate(1900);

            prop_assert!(result.years.iter().all(|r| r.end_balance >= 0.0));
            prop_assert!(result.ending_balance >= 0.0);
            if let Some(k) = result.years.iter().position(|r| r.depleted) {
                prop_assert!(result.years[k..].iter().all(|r| r.end_balance == 0.0 && r.depleted));
                prop_assert_eq!(result.depletion_year, Some(result.years[k].calendar_year));
                prop_assert!(!result.survived);
            } else {
                prop_assert!(result.survived);
            }
        }
    }
}
