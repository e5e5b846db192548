//! Command-line parsing for the saving plan simulator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the simulation code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{ExportDetail, FirstMonthPolicy, Period};
use crate::error::SimError;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "spd", version, about = "Saving plan day-of-month simulator")]
pub struct Cli {
    /// Log debug output from the simulator (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Simulate one saving plan and print its totals and last purchases.
    Run(RunArgs),
    /// Run every target day (1-31) over one period and compare terminal worth.
    Days(DaysArgs),
    /// Run every target day over generated historical windows.
    Windows(WindowsArgs),
    /// Generate a synthetic daily price CSV.
    Sample(SampleArgs),
    /// Print a day sweep JSON written by `spd days --export-json`.
    Show(ShowArgs),
}

/// Price data and monthly amount shared by all simulation commands.
#[derive(Debug, Args, Clone)]
pub struct PlanArgs {
    /// Daily price CSV (`date` + `close` columns). Prompts in a terminal when omitted.
    #[arg(short = 'f', long, env = "SPD_DATA", value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Cash invested every month.
    #[arg(short, long, default_value_t = 100.0)]
    pub amount: f64,

    /// Treatment of a first month that starts after the target day.
    #[arg(long, value_enum, default_value_t = FirstMonthPolicy::Drop)]
    pub first_month: FirstMonthPolicy,
}

/// Optional explicit period; both bounds or neither.
#[derive(Debug, Args, Clone)]
pub struct PeriodArgs {
    /// First day of the period (YYYY-MM-DD). Defaults to all data.
    #[arg(long, requires = "end")]
    pub start: Option<NaiveDate>,

    /// Last day of the period (YYYY-MM-DD).
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,
}

impl PeriodArgs {
    pub fn to_period(&self) -> Result<Period, SimError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Period::range(start, end),
            _ => Ok(Period::Max),
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    #[command(flatten)]
    pub period: PeriodArgs,

    /// Intended day of month for the purchase (1-31).
    #[arg(short, long, default_value_t = 1)]
    pub day: u32,

    /// Number of trailing purchases to print.
    #[arg(long, default_value_t = 12)]
    pub tail: usize,

    /// Export every purchase row to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_rows: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct DaysArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    #[command(flatten)]
    pub period: PeriodArgs,

    /// Write the sweep (per-day worth + summary) as JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct WindowsArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Minimum window length in years.
    #[arg(long, default_value_t = 15)]
    pub min_years: u32,

    /// Keep every N-th month as a window start/end.
    #[arg(long, default_value_t = 3)]
    pub step_months: usize,

    /// Worker threads (defaults to the number of CPUs).
    #[arg(long, env = "SPD_THREADS")]
    pub threads: Option<usize>,

    /// Windows processed per batch before results are handed to the writer.
    #[arg(long, default_value_t = crate::sweep::runner::DEFAULT_BATCH_WINDOWS)]
    pub batch_windows: usize,

    /// Write results to CSV while the sweep runs.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// What the export contains.
    #[arg(long, value_enum, default_value_t = ExportDetail::Summary)]
    pub export_detail: ExportDetail,

    /// Checkpoint the export every N simulation results.
    #[arg(long, default_value_t = 1000)]
    pub flush_every: usize,

    /// List the N widest and narrowest windows.
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short, long, value_name = "CSV")]
    pub out: PathBuf,

    #[arg(long, default_value = "2000-01-01")]
    pub start: NaiveDate,

    #[arg(long, default_value = "2024-12-31")]
    pub end: NaiveDate,

    #[arg(long, default_value_t = 100.0)]
    pub initial_price: f64,

    /// Annualised drift of log prices.
    #[arg(long, default_value_t = 0.07)]
    pub drift: f64,

    /// Annualised volatility of log prices.
    #[arg(long, default_value_t = 0.2)]
    pub volatility: f64,

    /// Probability that a weekday has no price (market holiday).
    #[arg(long, default_value_t = 0.03)]
    pub holiday_prob: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Day sweep JSON file.
    #[arg(long, value_name = "JSON")]
    pub json: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_parses_period_and_policy() {
        let cli = Cli::parse_from([
            "spd", "run", "-f", "prices.csv", "--day", "15", "--start", "2010-01-01", "--end",
            "2020-12-31", "--first-month", "keep",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.day, 15);
        assert_eq!(args.plan.first_month, FirstMonthPolicy::Keep);
        assert_eq!(
            args.period.to_period().unwrap(),
            Period::Range {
                start: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
            }
        );
    }

    #[test]
    fn start_without_end_is_rejected() {
        assert!(Cli::try_parse_from(["spd", "days", "-f", "p.csv", "--start", "2010-01-01"]).is_err());
    }

    #[test]
    fn windows_defaults() {
        let cli = Cli::parse_from(["spd", "windows", "-f", "p.csv", "--threads", "2"]);
        let Command::Windows(args) = cli.command else {
            panic!("expected windows");
        };
        assert_eq!(args.min_years, 15);
        assert_eq!(args.threads, Some(2));
        assert_eq!(args.export_detail, ExportDetail::Summary);
        assert_eq!(args.plan.first_month, FirstMonthPolicy::Drop);
    }
}
