//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initialises logging
//! - parses CLI arguments into config structs
//! - runs simulations and sweeps through the shared pipeline
//! - prints reports and writes optional exports

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Cli, Command, DaysArgs, PlanArgs, RunArgs, SampleArgs, ShowArgs, WindowsArgs};
use crate::domain::{DaysConfig, PlanConfig, RunConfig, SampleConfig, WindowsConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `spd` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run(args) => handle_run(&args),
        Command::Days(args) => handle_days(&args),
        Command::Windows(args) => handle_windows(&args),
        Command::Sample(args) => handle_sample(&args),
        Command::Show(args) => handle_show(&args),
    }
}

fn init_logging(verbose: bool) {
    let crate_level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // `try_init` so repeated calls (tests, embedding) are harmless.
    let _ = env_logger::Builder::new()
        .filter(None, log::LevelFilter::Warn)
        .filter(Some(env!("CARGO_CRATE_NAME")), crate_level)
        .parse_default_env()
        .try_init();
}

fn handle_run(args: &RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(args)?;
    let output = pipeline::run_plan(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&output.ingest.stats, &output.result, config.tail)
    );

    if let Some(path) = &config.export_rows {
        crate::io::export::write_rows_csv(path, &output.result)?;
        log::info!("wrote {} rows to {}", output.result.purchases(), path.display());
    }
    Ok(())
}

fn handle_days(args: &DaysArgs) -> Result<(), AppError> {
    let config = days_config_from_args(args)?;
    let output = pipeline::run_days(&config)?;

    println!("{}", crate::report::format_day_table(&output.file));

    if let Some(path) = &config.export_json {
        crate::io::summary::write_day_sweep_json(path, &output.file)?;
        log::info!("wrote day sweep to {}", path.display());
    }
    Ok(())
}

fn handle_windows(args: &WindowsArgs) -> Result<(), AppError> {
    let config = windows_config_from_args(args)?;
    let output = pipeline::run_windows(&config)?;

    if output.windows == 0 {
        return Err(AppError::new(
            3,
            format!(
                "Price data ({} .. {}) is too short for {}-year windows.",
                output.ingest.stats.first_date, output.ingest.stats.last_date, config.min_years
            ),
        ));
    }

    println!("{}", crate::report::format_sweep_report(&output.report, config.top_n));
    Ok(())
}

fn handle_sample(args: &SampleArgs) -> Result<(), AppError> {
    let config = sample_config_from_args(args);
    let sample = crate::data::generate_price_series(&config)?;
    crate::io::export::write_prices_csv(&args.out, &sample.series)?;

    println!(
        "Wrote {} prices ({} .. {}, close [{:.2}, {:.2}]) to {}",
        sample.stats.n_points,
        sample.stats.first_date,
        sample.stats.last_date,
        sample.stats.min_close,
        sample.stats.max_close,
        args.out.display()
    );
    Ok(())
}

fn handle_show(args: &ShowArgs) -> Result<(), AppError> {
    let file = crate::io::summary::read_day_sweep_json(&args.json)?;
    println!("{}", crate::report::format_day_table(&file));
    Ok(())
}

pub fn run_config_from_args(args: &RunArgs) -> Result<RunConfig, AppError> {
    let period = args.period.to_period()?;
    let plan = PlanConfig::new(args.plan.amount, args.day, period).with_first_month(args.plan.first_month);
    plan.validate()?;

    Ok(RunConfig {
        data_path: resolve_data_path(&args.plan)?,
        plan,
        tail: args.tail,
        export_rows: args.export_rows.clone(),
    })
}

pub fn days_config_from_args(args: &DaysArgs) -> Result<DaysConfig, AppError> {
    let period = args.period.to_period()?;
    crate::domain::validate_amount(args.plan.amount)?;

    Ok(DaysConfig {
        data_path: resolve_data_path(&args.plan)?,
        invest_amount: args.plan.amount,
        period,
        first_month: args.plan.first_month,
        export_json: args.export_json.clone(),
    })
}

pub fn windows_config_from_args(args: &WindowsArgs) -> Result<WindowsConfig, AppError> {
    crate::domain::validate_amount(args.plan.amount)?;
    if args.flush_every == 0 {
        return Err(AppError::new(2, "`--flush-every` must be >= 1."));
    }

    Ok(WindowsConfig {
        data_path: resolve_data_path(&args.plan)?,
        invest_amount: args.plan.amount,
        min_years: args.min_years,
        step_months: args.step_months,
        first_month: args.plan.first_month,
        threads: args.threads,
        batch_windows: args.batch_windows,
        export: args.export.clone(),
        export_detail: args.export_detail,
        flush_every: args.flush_every,
        top_n: args.top,
    })
}

pub fn sample_config_from_args(args: &SampleArgs) -> SampleConfig {
    SampleConfig {
        start: args.start,
        end: args.end,
        initial_price: args.initial_price,
        drift: args.drift,
        volatility: args.volatility,
        holiday_prob: args.holiday_prob,
        seed: args.seed,
    }
}

/// `--data` / `SPD_DATA`, or the interactive picker when attached to a terminal.
fn resolve_data_path(args: &PlanArgs) -> Result<PathBuf, AppError> {
    if let Some(path) = &args.data {
        return Ok(path.clone());
    }
    if std::io::stdin().is_terminal() {
        return crate::cli::picker::prompt_for_csv_path();
    }
    Err(AppError::new(
        2,
        "No price data given. Pass `--data <prices.csv>` or set SPD_DATA.",
    ))
}
