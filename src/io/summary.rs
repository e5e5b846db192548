//! Read/write day sweep JSON files.
//!
//! A day sweep file is the portable representation of one `spd days` run:
//! - run inputs (period, amount, first-month policy)
//! - terminal worth (or the failure) of every target day
//! - the best/worst day summary

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{FirstMonthPolicy, Period};
use crate::error::AppError;
use crate::sweep::{DaySummary, DaySweep};

/// Outcome of one target day as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayEntry {
    pub target_day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_worth: Option<f64>,
    #[serde(default)]
    pub purchases: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySweepFile {
    pub tool: String,
    pub period: Period,
    pub invest_amount: f64,
    pub first_month: FirstMonthPolicy,
    pub days: Vec<DayEntry>,
    pub summary: Option<DaySummary>,
}

impl DaySweepFile {
    pub fn from_sweep(sweep: &DaySweep, invest_amount: f64, first_month: FirstMonthPolicy) -> Self {
        let mut days: Vec<DayEntry> = sweep
            .results()
            .iter()
            .map(|r| DayEntry {
                target_day: r.target_day(),
                total_worth: Some(r.total_worth()),
                purchases: r.purchases(),
                error: None,
            })
            .chain(sweep.failures().iter().map(|f| DayEntry {
                target_day: f.target_day,
                total_worth: None,
                purchases: 0,
                error: Some(f.error.to_string()),
            }))
            .collect();
        days.sort_by_key(|d| d.target_day);

        Self {
            tool: "spd".to_string(),
            period: sweep.period(),
            invest_amount,
            first_month,
            days,
            summary: sweep.summary(),
        }
    }

    /// `(target_day, terminal_worth)` of every day that produced a result.
    pub fn worths(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.days
            .iter()
            .filter_map(|d| d.total_worth.map(|w| (d.target_day, w)))
    }
}

/// Write a day sweep JSON file.
pub fn write_day_sweep_json(path: &Path, file: &DaySweepFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create sweep JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write sweep JSON: {e}")))?;
    Ok(())
}

/// Read a day sweep JSON file.
pub fn read_day_sweep_json(path: &Path) -> Result<DaySweepFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open sweep JSON '{}': {e}", path.display())))?;
    let sweep: DaySweepFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid sweep JSON: {e}")))?;
    Ok(sweep)
}
