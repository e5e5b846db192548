//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during simulation and sweeps
//! - exported to JSON/CSV
//! - reloaded later for reporting

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Valid target days of month.
pub const TARGET_DAYS: std::ops::RangeInclusive<u32> = 1..=31;

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// The date range a simulation is evaluated over (both bounds inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Period {
    /// Everything the price series has.
    Max,
    Range { start: NaiveDate, end: NaiveDate },
}

impl Period {
    /// Build an explicit range, rejecting `start > end`.
    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self, SimError> {
        let period = Period::Range { start, end };
        period.validate()?;
        Ok(period)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        match self {
            Period::Max => Ok(()),
            Period::Range { start, end } if start > end => Err(SimError::InvalidConfig(format!(
                "period start {start} is after end {end}"
            ))),
            Period::Range { .. } => Ok(()),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Max => write!(f, "max"),
            Period::Range { start, end } => write!(f, "{start}..{end}"),
        }
    }
}

/// What to do with the first month of a period when the target day falls
/// before the first trading day available in that month.
///
/// Example: period starts on the 10th, target day is the 5th.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FirstMonthPolicy {
    /// Skip the month; the first purchase happens in the following month.
    #[default]
    Drop,
    /// Keep the month and buy on the first trading day at or after the target.
    Keep,
}

/// Inputs of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Cash invested every month.
    pub invest_amount: f64,
    /// Intended day of month (1..=31).
    pub target_day: u32,
    pub period: Period,
    #[serde(default)]
    pub first_month: FirstMonthPolicy,
}

impl PlanConfig {
    pub fn new(invest_amount: f64, target_day: u32, period: Period) -> Self {
        Self {
            invest_amount,
            target_day,
            period,
            first_month: FirstMonthPolicy::default(),
        }
    }

    pub fn with_first_month(mut self, policy: FirstMonthPolicy) -> Self {
        self.first_month = policy;
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        validate_amount(self.invest_amount)?;
        if !TARGET_DAYS.contains(&self.target_day) {
            return Err(SimError::InvalidConfig(format!(
                "target day {} is outside 1..=31",
                self.target_day
            )));
        }
        self.period.validate()
    }
}

/// Reject non-finite or non-positive investment amounts.
pub fn validate_amount(amount: f64) -> Result<(), SimError> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(SimError::InvalidConfig(format!(
            "invest amount must be finite and > 0 (got {amount})"
        )));
    }
    Ok(())
}

/// One monthly purchase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Actual trading day used for the purchase.
    pub date: NaiveDate,
    /// Close on `date`; purchase and valuation price.
    pub close: f64,
    pub bought_units: f64,
    /// Running total of `bought_units` up to and including this row.
    pub cumulative_units: f64,
    /// `cumulative_units * close`.
    pub total_worth: f64,
    pub target_day: u32,
}

/// A generated historical window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowSpec {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WindowSpec {
    pub fn period(self) -> Period {
        Period::Range {
            start: self.start,
            end: self.end,
        }
    }
}

impl From<WindowSpec> for Period {
    fn from(window: WindowSpec) -> Self {
        window.period()
    }
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// How much of each window sweep result the checkpoint writer persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportDetail {
    /// One line per (window, target day).
    Summary,
    /// Every purchase row of every run.
    Rows,
}

/// Configuration of a single `spd run`.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path: PathBuf,
    pub plan: PlanConfig,
    /// Number of trailing purchase rows to print (0 prints none).
    pub tail: usize,
    pub export_rows: Option<PathBuf>,
}

/// Configuration of an `spd days` sweep over one period.
#[derive(Debug, Clone)]
pub struct DaysConfig {
    pub data_path: PathBuf,
    pub invest_amount: f64,
    pub period: Period,
    pub first_month: FirstMonthPolicy,
    pub export_json: Option<PathBuf>,
}

/// Configuration of an `spd windows` sweep over generated windows.
#[derive(Debug, Clone)]
pub struct WindowsConfig {
    pub data_path: PathBuf,
    pub invest_amount: f64,
    pub min_years: u32,
    pub step_months: usize,
    pub first_month: FirstMonthPolicy,
    /// Worker threads (`None` = rayon default).
    pub threads: Option<usize>,
    /// Windows handed to the worker pool (and then to the sink) per batch.
    pub batch_windows: usize,
    pub export: Option<PathBuf>,
    pub export_detail: ExportDetail,
    /// Checkpoint every N simulation results.
    pub flush_every: usize,
    /// Number of widest/narrowest windows to list.
    pub top_n: usize,
}

/// Configuration of the synthetic price generator.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub initial_price: f64,
    /// Annualised drift of log prices.
    pub drift: f64,
    /// Annualised volatility of log prices.
    pub volatility: f64,
    /// Probability that a weekday is a market holiday (no row).
    pub holiday_prob: f64,
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn period_range_rejects_inverted_bounds() {
        let err = Period::range(d(2020, 2, 1), d(2020, 1, 1)).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
        assert!(Period::range(d(2020, 1, 1), d(2020, 1, 1)).is_ok());
    }

    #[test]
    fn plan_config_validation() {
        let period = Period::Max;
        assert!(PlanConfig::new(100.0, 1, period).validate().is_ok());
        assert!(PlanConfig::new(100.0, 31, period).validate().is_ok());
        assert!(PlanConfig::new(100.0, 0, period).validate().is_err());
        assert!(PlanConfig::new(100.0, 32, period).validate().is_err());
        assert!(PlanConfig::new(0.0, 5, period).validate().is_err());
        assert!(PlanConfig::new(-10.0, 5, period).validate().is_err());
        assert!(PlanConfig::new(f64::NAN, 5, period).validate().is_err());
    }

    #[test]
    fn period_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Period::range(d(2000, 1, 1), d(2015, 1, 31)).unwrap()).unwrap();
        assert_eq!(json, r#"{"kind":"range","start":"2000-01-01","end":"2015-01-31"}"#);
        let max: Period = serde_json::from_str(r#"{"kind":"max"}"#).unwrap();
        assert_eq!(max, Period::Max);
    }

    #[test]
    fn default_first_month_policy_is_drop() {
        assert_eq!(FirstMonthPolicy::default(), FirstMonthPolicy::Drop);
        assert_eq!(
            PlanConfig::new(1.0, 1, Period::Max).first_month,
            FirstMonthPolicy::Drop
        );
    }
}
