//! Consumers of completed window sweep batches.

use crate::error::SimError;
use crate::sweep::runner::WindowRun;

/// Receives completed batches from a [`crate::sweep::SweepRunner`].
///
/// `accept` is called synchronously between batches; the runner does not
/// start the next batch until it returns.
pub trait ResultSink {
    fn accept(&mut self, batch: Vec<WindowRun>) -> Result<(), SimError>;

    /// Called once after the last batch (also after cancellation).
    fn finish(&mut self) -> Result<(), SimError> {
        Ok(())
    }
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn accept(&mut self, batch: Vec<WindowRun>) -> Result<(), SimError> {
        (**self).accept(batch)
    }

    fn finish(&mut self) -> Result<(), SimError> {
        (**self).finish()
    }
}

/// Keeps every run in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    runs: Vec<WindowRun>,
    batches: usize,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> &[WindowRun] {
        &self.runs
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn into_runs(self) -> Vec<WindowRun> {
        self.runs
    }
}

impl ResultSink for CollectSink {
    fn accept(&mut self, batch: Vec<WindowRun>) -> Result<(), SimError> {
        self.batches += 1;
        self.runs.extend(batch);
        Ok(())
    }
}

/// Drops runs; for sweeps where only the report matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl ResultSink for DiscardSink {
    fn accept(&mut self, _batch: Vec<WindowRun>) -> Result<(), SimError> {
        Ok(())
    }
}
