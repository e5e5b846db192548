//! Error types.
//!
//! Two layers:
//!
//! - [`SimError`]: failures of the simulation core (engine, selector, sweeps).
//!   These are values callers inspect and categorise.
//! - [`AppError`]: what the `spd` binary reports, carrying a process exit code.

use thiserror::Error;

use crate::domain::Period;

/// Failure of a single simulation run or of a sweep's setup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Malformed target day, non-positive amount, inverted period, bad step.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No purchase rows survive filtering and boundary trimming.
    #[error("no purchase rows for target day {target_day} in period {period}")]
    EmptyResult { target_day: u32, period: Period },

    /// The day selector was left with more than one candidate for a month.
    #[error(
        "ambiguous purchase day for target day {target_day} in {year}-{month:02}: {candidates} candidates"
    )]
    AmbiguousSelection {
        year: i32,
        month: u32,
        target_day: u32,
        candidates: usize,
    },

    /// A downstream result sink refused a batch.
    #[error("result sink failed: {0}")]
    Sink(String),
}

/// Coarse category of a [`SimError`], used to count batch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimErrorKind {
    InvalidConfig,
    EmptyResult,
    AmbiguousSelection,
    Sink,
}

impl SimError {
    pub fn kind(&self) -> SimErrorKind {
        match self {
            SimError::InvalidConfig(_) => SimErrorKind::InvalidConfig,
            SimError::EmptyResult { .. } => SimErrorKind::EmptyResult,
            SimError::AmbiguousSelection { .. } => SimErrorKind::AmbiguousSelection,
            SimError::Sink(_) => SimErrorKind::Sink,
        }
    }

    /// Whether a sweep may record this failure and carry on.
    pub fn is_skippable(&self) -> bool {
        matches!(self, SimError::EmptyResult { .. })
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<SimError> for AppError {
    fn from(err: SimError) -> Self {
        let exit_code = match err.kind() {
            SimErrorKind::InvalidConfig => 2,
            SimErrorKind::EmptyResult => 3,
            SimErrorKind::AmbiguousSelection | SimErrorKind::Sink => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_errors_map_to_exit_codes() {
        let invalid = AppError::from(SimError::InvalidConfig("target day 0".to_string()));
        assert_eq!(invalid.exit_code(), 2);

        let empty = AppError::from(SimError::EmptyResult {
            target_day: 5,
            period: Period::Max,
        });
        assert_eq!(empty.exit_code(), 3);

        let ambiguous = AppError::from(SimError::AmbiguousSelection {
            year: 2020,
            month: 2,
            target_day: 5,
            candidates: 2,
        });
        assert_eq!(ambiguous.exit_code(), 4);
        assert!(ambiguous.to_string().contains("2020-02"));
    }

    #[test]
    fn only_empty_results_are_skippable() {
        assert!(
            SimError::EmptyResult {
                target_day: 1,
                period: Period::Max
            }
            .is_skippable()
        );
        assert!(!SimError::InvalidConfig("x".to_string()).is_skippable());
        assert!(!SimError::Sink("disk full".to_string()).is_skippable());
    }
}
