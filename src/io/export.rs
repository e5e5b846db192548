//! Export results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//!
//! - [`write_rows_csv`]: purchase rows of one run
//! - [`write_prices_csv`]: a price series (used for generated samples)
//! - [`CheckpointWriter`]: window sweep results, appended every N simulation results

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{ExportDetail, PriceSeries, WindowSpec};
use crate::error::{AppError, SimError};
use crate::plan::SavingPlanResult;
use crate::sweep::{ResultSink, WindowRun};

const ROWS_HEADER: &str = "date,target_day,close,bought_units,cumulative_units,total_worth";
const SWEEP_SUMMARY_HEADER: &str =
    "window_start,window_end,target_day,status,purchases,total_invested,total_units,total_worth";
const SWEEP_ROWS_HEADER: &str =
    "window_start,window_end,target_day,date,close,bought_units,cumulative_units,total_worth";

/// Write the purchase rows of one run to a CSV file.
pub fn write_rows_csv(path: &Path, result: &SavingPlanResult) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "{ROWS_HEADER}")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in result.rows() {
        writeln!(
            file,
            "{},{},{:.6},{:.10},{:.10},{:.6}",
            r.date, r.target_day, r.close, r.bought_units, r.cumulative_units, r.total_worth
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write a price series as a `date,close` CSV file.
pub fn write_prices_csv(path: &Path, series: &PriceSeries) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create price CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "date,close").map_err(|e| AppError::new(2, format!("Failed to write price CSV: {e}")))?;
    for p in series.points() {
        writeln!(out, "{},{:.6}", p.date, p.close)
            .map_err(|e| AppError::new(2, format!("Failed to write price CSV: {e}")))?;
    }
    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to write price CSV: {e}")))?;
    Ok(())
}

/// Window sweep sink that appends completed runs to CSV in checkpoints.
///
/// Runs are buffered until at least `flush_every` simulation results are
/// pending, then written and flushed together. `finish` writes the rest.
pub struct CheckpointWriter<W: Write> {
    out: W,
    detail: ExportDetail,
    flush_every: usize,
    pending: Vec<WindowRun>,
    pending_results: usize,
    written_results: usize,
    checkpoints: usize,
    header_written: bool,
}

impl CheckpointWriter<BufWriter<File>> {
    /// Create (truncate) `path` and write checkpoints to it.
    pub fn create(path: &Path, detail: ExportDetail, flush_every: usize) -> Result<Self, AppError> {
        let file = File::create(path)
            .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
        Ok(Self::new(BufWriter::new(file), detail, flush_every)?)
    }
}

impl<W: Write> CheckpointWriter<W> {
    pub fn new(out: W, detail: ExportDetail, flush_every: usize) -> Result<Self, SimError> {
        if flush_every == 0 {
            return Err(SimError::InvalidConfig("flush interval must be >= 1".to_string()));
        }
        Ok(Self {
            out,
            detail,
            flush_every,
            pending: Vec::new(),
            pending_results: 0,
            written_results: 0,
            checkpoints: 0,
            header_written: false,
        })
    }

    /// Simulation results written so far.
    pub fn written_results(&self) -> usize {
        self.written_results
    }

    /// Simulation results buffered but not yet written.
    pub fn pending_results(&self) -> usize {
        self.pending_results
    }

    pub fn checkpoints(&self) -> usize {
        self.checkpoints
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn checkpoint(&mut self) -> Result<(), SimError> {
        self.write_header()?;
        for run in std::mem::take(&mut self.pending) {
            let written = match self.detail {
                ExportDetail::Summary => write_summary_lines(&mut self.out, &run),
                ExportDetail::Rows => write_row_lines(&mut self.out, &run),
            };
            written.map_err(write_error)?;
        }
        self.out.flush().map_err(write_error)?;

        self.written_results += self.pending_results;
        self.pending_results = 0;
        self.checkpoints += 1;
        log::debug!(
            "checkpoint {}: {} results written",
            self.checkpoints,
            self.written_results
        );
        Ok(())
    }

    fn write_header(&mut self) -> Result<(), SimError> {
        if self.header_written {
            return Ok(());
        }
        let header = match self.detail {
            ExportDetail::Summary => SWEEP_SUMMARY_HEADER,
            ExportDetail::Rows => SWEEP_ROWS_HEADER,
        };
        writeln!(self.out, "{header}").map_err(write_error)?;
        self.header_written = true;
        Ok(())
    }
}

impl<W: Write> ResultSink for CheckpointWriter<W> {
    fn accept(&mut self, batch: Vec<WindowRun>) -> Result<(), SimError> {
        for run in batch {
            self.pending_results += run.days.results().len();
            self.pending.push(run);
            if self.pending_results >= self.flush_every {
                self.checkpoint()?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SimError> {
        if !self.pending.is_empty() || !self.header_written {
            self.checkpoint()?;
        }
        Ok(())
    }
}

fn write_error(e: std::io::Error) -> SimError {
    SimError::Sink(format!("failed to write export CSV: {e}"))
}

fn write_summary_lines<W: Write>(out: &mut W, run: &WindowRun) -> std::io::Result<()> {
    let WindowSpec { start, end } = run.window;
    for r in run.days.results() {
        writeln!(
            out,
            "{start},{end},{},ok,{},{:.2},{:.10},{:.6}",
            r.target_day(),
            r.purchases(),
            r.total_invested(),
            r.total_units(),
            r.total_worth()
        )?;
    }
    for f in run.days.failures() {
        let status = match f.error {
            SimError::EmptyResult { .. } => "empty_result",
            SimError::AmbiguousSelection { .. } => "ambiguous_selection",
            _ => "error",
        };
        writeln!(out, "{start},{end},{},{status},,,,", f.target_day)?;
    }
    Ok(())
}

fn write_row_lines<W: Write>(out: &mut W, run: &WindowRun) -> std::io::Result<()> {
    let WindowSpec { start, end } = run.window;
    for result in run.days.results() {
        for r in result.rows() {
            writeln!(
                out,
                "{start},{end},{},{},{:.6},{:.10},{:.10},{:.6}",
                r.target_day, r.date, r.close, r.bought_units, r.cumulative_units, r.total_worth
            )?;
        }
    }
    Ok(())
}
