//! Write the year-by-year trace of a single cohort to CSV
//!
//! Usage: cargo run --bin cohort_trace -- --data returns.csv --start-year 1966
//!        [--config plan.json] [--rate 0.045] [--equity 0.5]

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use cohort_sim::{load_series, CohortSimulator, GlideConfig, SimulationConfig, WithdrawalOrder};

#[derive(Parser)]
#[command(name = "cohort_trace", about = "Per-year trace of one retirement cohort")]
struct Args {
    #[arg(long)]
    data: PathBuf,

    #[arg(long)]
    start_year: i32,

    /// JSON plan (same format as `cohort_sim --config`); flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    horizon: Option<u32>,

    #[arg(long)]
    balance: Option<f64>,

    #[arg(long)]
    rate: Option<f64>,

    /// Hold withdrawals flat in nominal terms
    #[arg(long)]
    flat: bool,

    #[arg(long)]
    ratchet: Option<f64>,

    /// Fixed equity fraction, replacing any glide path
    #[arg(long)]
    equity: Option<f64>,

    #[arg(long)]
    withdraw_first: bool,

    #[arg(long, default_value = "cohort_trace.csv")]
    output: PathBuf,
}

impl Args {
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
        if let Some(equity) = self.equity {
            config.glide = GlideConfig::fixed(equity);
        }
        if self.withdraw_first {
            config.withdrawal_order = WithdrawalOrder::WithdrawThenGrowth;
        }
        config.detailed_output = true;

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args.to_config()?;
    let series = load_series(&args.data)
        .with_context(|| format!("loading {}", args.data.display()))?;
    if series.get(args.start_year).is_none() {
        bail!(
            "start year {} outside data range {}-{}",
            args.start_year,
            series.first_year(),
            series.last_year()
        );
    }

    let simulator = CohortSimulator::new(&series, &config)?;
    let result = simulator.simulate(args.start_year);

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for row in &result.years {
        writer.serialize(row)?;
    }
    writer.flush()?;

    println!(
        "Cohort {}: {} years written to {}",
        result.start_year,
        result.years.len(),
        args.output.display()
    );
    if let Some(warning) = result.truncation {
        println!("  warning: {}", warning);
    }
    match result.depletion_year {
        Some(year) => println!("  depleted in {}", year),
        None => println!(
            "  ending balance ${:.2} (real ${:.2})",
            result.ending_balance, result.ending_real_balance
        ),
    }
    Ok(())
}
