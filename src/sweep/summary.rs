//! Best/worst day summaries over a set of terminal worths.
//!
//! Ties are broken deterministically: the lowest target day wins, both for
//! the best and for the worst day.

use serde::{Deserialize, Serialize};

use crate::domain::WindowSpec;

/// Comparison of the target days of one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub best_day: u32,
    pub best_worth: f64,
    pub worst_day: u32,
    pub worst_worth: f64,
    /// `best_worth - worst_worth`.
    pub spread_abs: f64,
    /// Spread relative to the worst day, in percent.
    pub spread_pct: f64,
    /// Number of days that produced a result.
    pub days_ok: usize,
}

impl DaySummary {
    /// Summarise `(target_day, terminal_worth)` pairs. `None` when empty.
    pub fn from_worths<I>(worths: I) -> Option<Self>
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        let mut iter = worths.into_iter();
        let (day, worth) = iter.next()?;
        let mut best = (day, worth);
        let mut worst = (day, worth);
        let mut days_ok = 1;

        for (day, worth) in iter {
            days_ok += 1;
            if worth > best.1 || (worth == best.1 && day < best.0) {
                best = (day, worth);
            }
            if worth < worst.1 || (worth == worst.1 && day < worst.0) {
                worst = (day, worth);
            }
        }

        let spread_abs = best.1 - worst.1;
        Some(Self {
            best_day: best.0,
            best_worth: best.1,
            worst_day: worst.0,
            worst_worth: worst.1,
            spread_abs,
            spread_pct: spread_pct(spread_abs, worst.1),
            days_ok,
        })
    }
}

fn spread_pct(spread_abs: f64, worst: f64) -> f64 {
    if worst > 0.0 {
        spread_abs / worst * 100.0
    } else {
        0.0
    }
}

/// Per-window outcome of a window sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub window: WindowSpec,
    pub min_day: u32,
    pub min_worth: f64,
    pub max_day: u32,
    pub max_worth: f64,
    pub spread_pct: f64,
    pub days_ok: usize,
}

impl WindowSummary {
    pub fn new(window: WindowSpec, days: &DaySummary) -> Self {
        Self {
            window,
            min_day: days.worst_day,
            min_worth: days.worst_worth,
            max_day: days.best_day,
            max_worth: days.best_worth,
            spread_pct: days.spread_pct,
            days_ok: days.days_ok,
        }
    }
}
