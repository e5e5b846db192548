//! Shared pipeline logic used by the `spd` subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! price CSV ingest -> simulation or sweep -> outputs ready for reporting/export
//!
//! The handlers in `app` can then focus on presentation and exports.

use crate::domain::{DaysConfig, RunConfig, WindowSpec, WindowsConfig};
use crate::error::AppError;
use crate::io::export::CheckpointWriter;
use crate::io::ingest::{IngestedSeries, load_price_series};
use crate::io::summary::DaySweepFile;
use crate::plan::{SavingPlan, SavingPlanResult};
use crate::sweep::{DiscardSink, ResultSink, SweepOptions, SweepReport, SweepRunner, generate_windows, sweep_days};

/// Outputs of `spd run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedSeries,
    pub result: SavingPlanResult,
}

/// Outputs of `spd days`.
#[derive(Debug, Clone)]
pub struct DaysOutput {
    pub ingest: IngestedSeries,
    pub file: DaySweepFile,
}

/// Outputs of `spd windows`.
#[derive(Debug, Clone)]
pub struct WindowsOutput {
    pub ingest: IngestedSeries,
    pub windows: usize,
    pub report: SweepReport,
}

pub fn run_plan(config: &RunConfig) -> Result<RunOutput, AppError> {
    let ingest = load_price_series(&config.data_path)?;
    let plan = SavingPlan::new(&ingest.series, config.plan)?;
    let result = plan.into_result()?;
    Ok(RunOutput { ingest, result })
}

pub fn run_days(config: &DaysConfig) -> Result<DaysOutput, AppError> {
    let ingest = load_price_series(&config.data_path)?;
    let sweep = sweep_days(
        &ingest.series,
        config.invest_amount,
        &config.period,
        config.first_month,
    )?;
    if sweep.results().is_empty() {
        return Err(AppError::new(
            3,
            format!("No target day produced a result for period {}.", config.period),
        ));
    }

    let file = DaySweepFile::from_sweep(&sweep, config.invest_amount, config.first_month);
    Ok(DaysOutput { ingest, file })
}

pub fn run_windows(config: &WindowsConfig) -> Result<WindowsOutput, AppError> {
    let ingest = load_price_series(&config.data_path)?;
    let windows = generate_windows(&ingest.series, config.min_years, config.step_months)?;

    let runner = SweepRunner::new(SweepOptions {
        threads: config.threads,
        batch_windows: config.batch_windows,
        first_month: config.first_month,
        ..SweepOptions::default()
    })?;

    let report = match &config.export {
        Some(path) => {
            let mut writer = CheckpointWriter::create(path, config.export_detail, config.flush_every)?;
            let report = sweep_into(&runner, &ingest, config, &windows, &mut writer)?;
            log::info!(
                "wrote {} results to {} in {} checkpoints",
                writer.written_results(),
                path.display(),
                writer.checkpoints()
            );
            report
        }
        None => sweep_into(&runner, &ingest, config, &windows, &mut DiscardSink)?,
    };

    Ok(WindowsOutput {
        ingest,
        windows: windows.len(),
        report,
    })
}

fn sweep_into<S: ResultSink + ?Sized>(
    runner: &SweepRunner,
    ingest: &IngestedSeries,
    config: &WindowsConfig,
    windows: &[WindowSpec],
    sink: &mut S,
) -> Result<SweepReport, AppError> {
    Ok(runner.run(&ingest.series, config.invest_amount, windows, sink)?)
}
