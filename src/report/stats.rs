//! Distribution statistics across window sweep results.

use statrs::statistics::{Data, Distribution, Max, Min, OrderStatistics};

use crate::domain::TARGET_DAYS;
use crate::sweep::WindowSummary;

/// Five-number summary plus mean of per-window percentage spreads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadDistribution {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

impl SpreadDistribution {
    /// `None` when no window has a finite spread.
    pub fn from_summaries(summaries: &[WindowSummary]) -> Option<Self> {
        let values: Vec<f64> = summaries
            .iter()
            .map(|s| s.spread_pct)
            .filter(|v| v.is_finite())
            .collect();
        Self::from_values(values)
    }

    pub fn from_values(values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mut data = Data::new(values);
        let mean = data.mean()?;

        Some(Self {
            count,
            min: Min::min(&data),
            q1: data.lower_quartile(),
            median: data.percentile(50),
            q3: data.upper_quartile(),
            max: Max::max(&data),
            mean,
        })
    }
}

/// How often each target day was the best (index 0 = day 1).
pub fn best_day_counts(summaries: &[WindowSummary]) -> Vec<usize> {
    let mut counts = vec![0; TARGET_DAYS.count()];
    for s in summaries {
        if let Some(slot) = counts.get_mut((s.max_day as usize).wrapping_sub(1)) {
            *slot += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WindowSpec;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn summary(spread_pct: f64, max_day: u32) -> WindowSummary {
        let d = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        WindowSummary {
            window: WindowSpec { start: d, end: d },
            min_day: 1,
            min_worth: 100.0,
            max_day,
            max_worth: 100.0 + spread_pct,
            spread_pct,
            days_ok: 31,
        }
    }

    #[test]
    fn distribution_is_ordered_with_exact_median() {
        let summaries: Vec<_> = [4.0, 1.0, 3.0, 2.0, 5.0, f64::NAN]
            .into_iter()
            .map(|v| summary(v, 1))
            .collect();
        let dist = SpreadDistribution::from_summaries(&summaries).unwrap();
        assert_eq!(dist.count, 5);
        assert_relative_eq!(dist.min, 1.0);
        assert_relative_eq!(dist.median, 3.0);
        assert_relative_eq!(dist.max, 5.0);
        assert_relative_eq!(dist.mean, 3.0);
        assert!(dist.min <= dist.q1 && dist.q1 <= dist.median);
        assert!(dist.median <= dist.q3 && dist.q3 <= dist.max);
    }

    #[test]
    fn empty_distribution_is_none() {
        assert!(SpreadDistribution::from_summaries(&[]).is_none());
        assert!(SpreadDistribution::from_summaries(&[summary(f64::NAN, 1)]).is_none());
    }

    #[test]
    fn best_day_counts_per_day() {
        let counts = best_day_counts(&[summary(1.0, 3), summary(2.0, 3), summary(1.0, 31)]);
        assert_eq!(counts.len(), 31);
        assert_eq!(counts[2], 2);
        assert_eq!(counts[30], 1);
        assert_eq!(counts.iter().sum::<usize>(), 3);
    }
}
