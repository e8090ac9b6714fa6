//! Cohort simulator CLI
//!
//! Replays a retirement plan against every start year of a historical series,
//! or searches for the safe withdrawal rate.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;

use cohort_sim::{
    load_series, solver, summary, CohortOutcome, SimulationConfig, SimulationRunner, SuccessRule,
    WithdrawalOrder,
};

#[derive(Parser)]
#[command(name = "cohort_sim", version, about = "Historical-sequence retirement simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate every start year and print the outcome distribution
    Run(RunArgs),
    /// Find the safe withdrawal and ratchet rates
    Solve(PlanArgs),
}

#[derive(Args)]
struct PlanArgs {
    /// Historical series CSV (year,equity_return,bond_return,inflation[,dividend_yield])
    #[arg(long)]
    data: PathBuf,

    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    horizon: Option<u32>,

    #[arg(long)]
    balance: Option<f64>,

    /// Initial withdrawal rate (0.04 = 4%)
    #[arg(long)]
    rate: Option<f64>,

    /// Hold withdrawals flat in nominal terms instead of following inflation
    #[arg(long)]
    flat: bool,

    /// Raise spending to this fraction of the balance when withdrawals fall below it
    #[arg(long)]
    ratchet: Option<f64>,

    #[arg(long)]
    start_equity: Option<f64>,

    #[arg(long)]
    end_equity: Option<f64>,

    #[arg(long)]
    transition_years: Option<u32>,

    /// Withdraw at the start of the year, before growth
    #[arg(long)]
    withdraw_first: bool,

    #[arg(long, value_enum)]
    success_rule: Option<RuleArg>,

    /// Simulate cohorts in parallel
    #[arg(long)]
    parallel: bool,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    plan: PlanArgs,

    /// Print results and summary as JSON
    #[arg(long)]
    json: bool,

    /// Percentiles of ending balance to report
    #[arg(long, value_delimiter = ',', default_values_t = summary::DEFAULT_PERCENTILES)]
    percentiles: Vec<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RuleArg {
    Survival,
    Preservation,
}

impl From<RuleArg> for SuccessRule {
    fn from(arg: RuleArg) -> Self {
        match arg {
            RuleArg::Survival => SuccessRule::Survival,
            RuleArg::Preservation => SuccessRule::Preservation,
        }
    }
}

impl PlanArgs {
    fn to_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                SimulationConfig::from_json(&json)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => SimulationConfig::default(),
        };

        if let Some(horizon) = self.horizon {
            config.horizon_years = horizon;
        }
        if let Some(balance) = self.balance {
            config.initial_balance = balance;
        }
        if let Some(rate) = self.rate {
            config.withdrawal.initial_rate = rate;
        }
        if self.flat {
            config.withdrawal.inflation_adjusted = false;
        }
        if self.ratchet.is_some() {
            config.withdrawal.ratchet_rate = self.ratchet;
        }
        if let Some(pct) = self.start_equity {
            config.glide.start_equity_pct = pct;
        }
        if let Some(pct) = self.end_equity {
            config.glide.end_equity_pct = pct;
        }
        if let Some(years) = self.transition_years {
            config.glide.transition_years = years;
        }
        if self.withdraw_first {
            config.withdrawal_order = WithdrawalOrder::WithdrawThenGrowth;
        }
        if let Some(rule) = self.success_rule {
            config.success_rule = rule.into();
        }
        config.parallel |= self.parallel;

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn run(args: RunArgs) -> Result<()> {
    let config = args.plan.to_config()?;
    let series = load_series(&args.plan.data)
        .with_context(|| format!("loading {}", args.plan.data.display()))?;

    let runner = SimulationRunner::new(series);
    let results = runner.run(&config)?;
    let summary = summary::summarize(&results, &args.percentiles)?;

    if args.json {
        let output = serde_json::json!({
            "config": config,
            "results": results,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{:>6} {:>16} {:>16} {:>10}  Outcome",
        "Start", "Ending", "Ending (real)", "Years"
    );
    println!("{}", "-".repeat(72));
    for r in &results {
        let outcome = match r.outcome() {
            CohortOutcome::Survived => "survived".to_string(),
            CohortOutcome::SurvivedTruncated { years_covered } => {
                format!("survived {} yrs (truncated)", years_covered)
            }
            CohortOutcome::Depleted { year } => format!("depleted {}", year),
        };
        println!(
            "{:>6} {:>16.2} {:>16.2} {:>10}  {}",
            r.start_year, r.ending_balance, r.ending_real_balance, r.years_simulated, outcome
        );
    }

    match summary {
        Some(s) => {
            println!("\nSummary:");
            println!(
                "  Cohorts:            {} ({} complete, {} truncated)",
                s.cohorts, s.complete_cohorts, s.truncated_cohorts
            );
            println!("  Depleted:           {}", s.depleted_cohorts);
            println!("  Survival rate:      {:.2}%", s.survival_rate * 100.0);
            println!("  Preservation rate:  {:.2}%", s.preservation_rate * 100.0);
            println!("  Worst start year:   {}", s.worst_start_year);
            println!("  Best start year:    {}", s.best_start_year);
            println!("  Median real ending: ${:.2}", s.median_ending_real_balance);
            for (p, value) in &s.percentile_ending_balance {
                println!("  P{:<3} ending:        ${:.2}", p, value);
            }
        }
        None => println!("\nNo cohort covers the full horizon or depleted; no summary."),
    }

    Ok(())
}

fn solve(args: PlanArgs) -> Result<()> {
    let config = args.to_config()?;
    let series = load_series(&args.data)
        .with_context(|| format!("loading {}", args.data.display()))?;

    let rates = solver::solve(&series, &config)?;
    println!("Cohorts tested:        {}", rates.cohorts_tested);
    println!("Safe withdrawal rate:  {:.2}%", rates.withdrawal_rate * 100.0);
    match rates.ratchet_rate {
        Some(rate) => println!("Safe ratchet rate:     {:.2}%", rate * 100.0),
        None => println!("Safe ratchet rate:     none"),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Run(args) => run(args),
        Command::Solve(args) => solve(args),
    }
}
