//! Historical window generation.
//!
//! We sweep many windows using a deterministic month grid over the series.
//!
//! - candidate starts run from the first month of the data up to the last
//!   month a `min_years` window can still start in
//! - candidate ends run over every month of the data
//! - both lists are thinned to every `step_months`-th entry
//! - a (start, end) pair is kept when `start.months_until(end) >= 12 * min_years`
//!
//! Windows cover whole months: first calendar day of the start month to the
//! last calendar day of the end month. Output is start-major, end-minor.

use crate::domain::{PriceSeries, WindowSpec, YearMonth};
use crate::error::SimError;

/// Month grid of one series, before pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub starts: Vec<YearMonth>,
    pub ends: Vec<YearMonth>,
}

/// Candidate start and end months for `series`.
pub fn month_grid(
    series: &PriceSeries,
    min_years: u32,
    step_months: usize,
) -> Result<MonthGrid, SimError> {
    validate(min_years, step_months)?;

    let Some((first, last)) = series.month_span() else {
        return Ok(MonthGrid {
            starts: Vec::new(),
            ends: Vec::new(),
        });
    };

    let cutoff = YearMonth::from_ordinal(last.ordinal() - min_months(min_years));
    let starts = first.range_inclusive(cutoff).step_by(step_months).collect();
    let ends = first.range_inclusive(last).step_by(step_months).collect();
    Ok(MonthGrid { starts, ends })
}

/// All windows of at least `min_years` years over `series`.
pub fn generate_windows(
    series: &PriceSeries,
    min_years: u32,
    step_months: usize,
) -> Result<Vec<WindowSpec>, SimError> {
    let grid = month_grid(series, min_years, step_months)?;
    let min_months = min_months(min_years);

    let mut out = Vec::new();
    for &start in &grid.starts {
        for &end in &grid.ends {
            if start.months_until(end) < min_months {
                continue;
            }
            if let Some(window) = whole_months(start, end) {
                out.push(window);
            }
        }
    }

    log::debug!(
        "generated {} windows ({} starts x {} ends, min {} years, step {} months)",
        out.len(),
        grid.starts.len(),
        grid.ends.len(),
        min_years,
        step_months
    );
    Ok(out)
}

fn validate(min_years: u32, step_months: usize) -> Result<(), SimError> {
    if min_years == 0 {
        return Err(SimError::InvalidConfig(
            "minimum window length must be >= 1 year".to_string(),
        ));
    }
    if step_months == 0 {
        return Err(SimError::InvalidConfig(
            "window step must be >= 1 month".to_string(),
        ));
    }
    Ok(())
}

fn min_months(min_years: u32) -> i64 {
    12 * i64::from(min_years)
}

fn whole_months(start: YearMonth, end: YearMonth) -> Option<WindowSpec> {
    Some(WindowSpec {
        start: start.first_day()?,
        end: end.last_day()?,
    })
}
