//! Sweeps: every target day over one period, and every target day over many windows.
//!
//! Each (period, day) simulation is independent, so both sweeps fan out with rayon
//! and only merge the per-task outcomes afterwards. Outcomes are always merged
//! in day order, so results do not depend on scheduling.
//!
//! Window sweeps run in batches on a bounded worker pool. After each batch the
//! completed runs are handed to a [`ResultSink`]; the next batch starts only once
//! the sink returns.

use rayon::prelude::*;

use crate::domain::{
    FirstMonthPolicy, Period, PlanConfig, PriceSeries, TARGET_DAYS, WindowSpec, validate_amount,
};
use crate::error::{SimError, SimErrorKind};
use crate::plan::{SavingPlanResult, simulate};
use crate::sweep::cancel::CancelToken;
use crate::sweep::sink::{CollectSink, ResultSink};
use crate::sweep::summary::{DaySummary, WindowSummary};

/// Default number of windows per batch.
pub const DEFAULT_BATCH_WINDOWS: usize = 64;

/// Number of simulations per period in a day sweep.
pub fn days_per_period() -> usize {
    TARGET_DAYS.count()
}

/// A target day whose run failed.
#[derive(Debug, Clone, PartialEq)]
pub struct DayFailure {
    pub target_day: u32,
    pub error: SimError,
}

/// Outcome of running all 31 target days over one period.
#[derive(Debug, Clone)]
pub struct DaySweep {
    period: Period,
    results: Vec<SavingPlanResult>,
    failures: Vec<DayFailure>,
    cancelled: usize,
}

impl DaySweep {
    pub fn period(&self) -> Period {
        self.period
    }

    /// Successful runs in ascending target day order.
    pub fn results(&self) -> &[SavingPlanResult] {
        &self.results
    }

    pub fn failures(&self) -> &[DayFailure] {
        &self.failures
    }

    /// Days skipped because the sweep was cancelled before they started.
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }

    pub fn result_for(&self, target_day: u32) -> Option<&SavingPlanResult> {
        self.results.iter().find(|r| r.target_day() == target_day)
    }

    /// `(target_day, terminal_worth)` of every successful run.
    pub fn worths(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.results.iter().map(|r| (r.target_day(), r.total_worth()))
    }

    pub fn summary(&self) -> Option<DaySummary> {
        DaySummary::from_worths(self.worths())
    }
}

enum DayOutcome {
    Done(SavingPlanResult),
    Failed(SimError),
    Cancelled,
}

/// Run target days 1..=31 over `period`.
///
/// Invalid amount or period fails the whole call; per-day failures are recorded
/// in the returned sweep.
pub fn sweep_days(
    series: &PriceSeries,
    amount: f64,
    period: &Period,
    first_month: FirstMonthPolicy,
) -> Result<DaySweep, SimError> {
    validate_amount(amount)?;
    period.validate()?;
    Ok(run_days(series, amount, *period, first_month, None))
}

fn run_days(
    series: &PriceSeries,
    amount: f64,
    period: Period,
    first_month: FirstMonthPolicy,
    cancel: Option<&CancelToken>,
) -> DaySweep {
    let outcomes: Vec<(u32, DayOutcome)> = TARGET_DAYS
        .into_par_iter()
        .map(|day| {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return (day, DayOutcome::Cancelled);
            }
            let config = PlanConfig::new(amount, day, period).with_first_month(first_month);
            match simulate(series, &config) {
                Ok(result) => (day, DayOutcome::Done(result)),
                Err(error) => (day, DayOutcome::Failed(error)),
            }
        })
        .collect();

    let mut sweep = DaySweep {
        period,
        results: Vec::with_capacity(outcomes.len()),
        failures: Vec::new(),
        cancelled: 0,
    };
    for (target_day, outcome) in outcomes {
        match outcome {
            DayOutcome::Done(result) => sweep.results.push(result),
            DayOutcome::Failed(error) => sweep.failures.push(DayFailure { target_day, error }),
            DayOutcome::Cancelled => sweep.cancelled += 1,
        }
    }
    sweep
}

/// All target days over one generated window.
#[derive(Debug, Clone)]
pub struct WindowRun {
    pub window: WindowSpec,
    pub days: DaySweep,
}

impl WindowRun {
    pub fn summary(&self) -> Option<WindowSummary> {
        self.days
            .summary()
            .map(|days| WindowSummary::new(self.window, &days))
    }
}

/// Failed or skipped (window, day) tasks by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureCounts {
    pub empty_result: usize,
    pub ambiguous_selection: usize,
    pub other: usize,
    pub cancelled: usize,
}

impl FailureCounts {
    pub fn record(&mut self, error: &SimError) {
        match error.kind() {
            SimErrorKind::EmptyResult => self.empty_result += 1,
            SimErrorKind::AmbiguousSelection => self.ambiguous_selection += 1,
            SimErrorKind::InvalidConfig | SimErrorKind::Sink => self.other += 1,
        }
    }

    pub fn failed(&self) -> usize {
        self.empty_result + self.ambiguous_selection + self.other
    }

    pub fn total(&self) -> usize {
        self.failed() + self.cancelled
    }
}

/// Aggregate outcome of a window sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub windows_total: usize,
    /// Windows whose 31 tasks all ran (successfully or not).
    pub windows_completed: usize,
    pub tasks_ok: usize,
    pub failures: FailureCounts,
    pub cancelled: bool,
    pub batches: usize,
    /// One entry per window with at least one successful day.
    pub summaries: Vec<WindowSummary>,
}

impl SweepReport {
    fn new(windows_total: usize) -> Self {
        Self {
            windows_total,
            ..Self::default()
        }
    }

    pub fn tasks_total(&self) -> usize {
        self.windows_total * days_per_period()
    }

    fn record(&mut self, run: &WindowRun) {
        self.tasks_ok += run.days.results().len();
        for failure in run.days.failures() {
            self.failures.record(&failure.error);
            if failure.error.is_skippable() {
                log::debug!("window {} day {}: {}", run.window, failure.target_day, failure.error);
            } else {
                log::warn!("window {} day {}: {}", run.window, failure.target_day, failure.error);
            }
        }
        if run.days.cancelled() > 0 {
            self.failures.cancelled += run.days.cancelled();
            self.cancelled = true;
        } else {
            self.windows_completed += 1;
        }
        if let Some(summary) = run.summary() {
            self.summaries.push(summary);
        }
    }

    fn cancel_remaining(&mut self, windows: usize) {
        self.failures.cancelled += windows * days_per_period();
        self.cancelled = true;
    }
}

/// Window sweep settings.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    /// Worker threads (`None` = rayon default).
    pub threads: Option<usize>,
    pub batch_windows: usize,
    pub first_month: FirstMonthPolicy,
    pub cancel: CancelToken,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            threads: None,
            batch_windows: DEFAULT_BATCH_WINDOWS,
            first_month: FirstMonthPolicy::default(),
            cancel: CancelToken::new(),
        }
    }
}

/// Runs window × day sweeps on its own worker pool.
pub struct SweepRunner {
    pool: rayon::ThreadPool,
    options: SweepOptions,
}

impl SweepRunner {
    pub fn new(options: SweepOptions) -> Result<Self, SimError> {
        if options.batch_windows == 0 {
            return Err(SimError::InvalidConfig(
                "windows per batch must be >= 1".to_string(),
            ));
        }
        if options.threads == Some(0) {
            return Err(SimError::InvalidConfig(
                "worker threads must be >= 1".to_string(),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.threads.unwrap_or(0))
            .thread_name(|i| format!("spd-sweep-{i}"))
            .build()
            .map_err(|e| SimError::InvalidConfig(format!("failed to start worker pool: {e}")))?;

        Ok(Self { pool, options })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.options.cancel.clone()
    }

    pub fn options(&self) -> &SweepOptions {
        &self.options
    }

    /// Sweep every target day over every window, batch by batch.
    ///
    /// Task failures are counted in the report. An invalid amount, a window
    /// with `start > end` and sink errors abort the sweep before or between
    /// batches.
    pub fn run<S: ResultSink + ?Sized>(
        &self,
        series: &PriceSeries,
        amount: f64,
        windows: &[WindowSpec],
        sink: &mut S,
    ) -> Result<SweepReport, SimError> {
        validate_amount(amount)?;
        for window in windows {
            window.period().validate()?;
        }

        let batch_size = self.options.batch_windows;
        let batch_count = windows.len().div_ceil(batch_size);
        let mut report = SweepReport::new(windows.len());

        log::info!(
            "sweeping {} windows x {} days on {} threads ({} batches)",
            windows.len(),
            days_per_period(),
            self.threads(),
            batch_count
        );

        for (index, batch) in windows.chunks(batch_size).enumerate() {
            if self.options.cancel.is_cancelled() {
                let remaining = windows.len() - index * batch_size;
                report.cancel_remaining(remaining);
                log::warn!(
                    "sweep cancelled before batch {}/{}: {} windows not started",
                    index + 1,
                    batch_count,
                    remaining
                );
                break;
            }

            let runs: Vec<WindowRun> = self.pool.install(|| {
                batch
                    .par_iter()
                    .map(|&window| self.run_window(series, amount, window))
                    .collect()
            });
            for run in &runs {
                report.record(run);
            }
            report.batches += 1;

            sink.accept(runs)?;
            log::info!(
                "batch {}/{} done: {}/{} windows, {} ok, {} failed",
                index + 1,
                batch_count,
                report.windows_completed,
                report.windows_total,
                report.tasks_ok,
                report.failures.failed()
            );
        }

        sink.finish()?;
        Ok(report)
    }

    fn run_window(&self, series: &PriceSeries, amount: f64, window: WindowSpec) -> WindowRun {
        WindowRun {
            window,
            days: run_days(
                series,
                amount,
                window.period(),
                self.options.first_month,
                Some(&self.options.cancel),
            ),
        }
    }
}

/// Run every target day over every window and keep all results in memory.
pub fn sweep_windows(
    series: &PriceSeries,
    amount: f64,
    windows: &[WindowSpec],
) -> Result<Vec<WindowRun>, SimError> {
    let runner = SweepRunner::new(SweepOptions::default())?;
    let mut sink = CollectSink::new();
    runner.run(series, amount, windows, &mut sink)?;
    Ok(sink.into_runs())
}
