//! Batches of saving plan runs.
//!
//! - [`windows`]: historical window generation
//! - [`runner`]: day sweeps and window × day sweeps (rayon)
//! - [`summary`]: best/worst day and spread per period
//! - [`sink`]: consumers of completed window batches
//! - [`cancel`]: cooperative cancellation

pub mod cancel;
pub mod runner;
pub mod sink;
pub mod summary;
pub mod windows;

pub use cancel::CancelToken;
pub use runner::{
    DayFailure, DaySweep, FailureCounts, SweepOptions, SweepReport, SweepRunner, WindowRun,
    sweep_days, sweep_windows,
};
pub use sink::{CollectSink, DiscardSink, ResultSink};
pub use summary::{DaySummary, WindowSummary};
pub use windows::{generate_windows, month_grid};
