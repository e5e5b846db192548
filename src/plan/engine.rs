//! Saving plan simulation.
//!
//! One run is a staged pipeline over the borrowed price slice:
//!
//! 1. window the series to the period (binary search, no copy)
//! 2. group points by calendar month
//! 3. trim the period's boundary months
//! 4. select one purchase day per month
//! 5. accumulate units and mark to market at each purchase
//!
//! Boundary trimming:
//! - first month: with [`FirstMonthPolicy::Drop`], the period's starting month is
//!   skipped when the target day is earlier than its first available day
//! - last month: the period's ending month is skipped when the target day is
//!   later than its last available day
//!
//! For [`Period::Max`] the first and last dates of the series act as the period bounds.

use std::sync::OnceLock;

use chrono::NaiveDate;

use crate::domain::{
    FirstMonthPolicy, MonthGroup, Period, PlanConfig, PriceSeries, ResultRow, YearMonth, month_groups,
};
use crate::error::SimError;
use crate::plan::selector::select_purchase;

/// Completed run: purchase rows in date order (never empty).
#[derive(Debug, Clone, PartialEq)]
pub struct SavingPlanResult {
    config: PlanConfig,
    rows: Vec<ResultRow>,
}

impl SavingPlanResult {
    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn target_day(&self) -> u32 {
        self.config.target_day
    }

    pub fn period(&self) -> Period {
        self.config.period
    }

    /// Number of monthly purchases.
    pub fn purchases(&self) -> usize {
        self.rows.len()
    }

    /// Terminal total worth: valuation of all units at the last purchase.
    pub fn total_worth(&self) -> f64 {
        self.rows.last().map_or(0.0, |r| r.total_worth)
    }

    pub fn total_units(&self) -> f64 {
        self.rows.last().map_or(0.0, |r| r.cumulative_units)
    }

    /// Cash put in over the whole run.
    pub fn total_invested(&self) -> f64 {
        self.config.invest_amount * self.rows.len() as f64
    }

    pub fn first_purchase(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_purchase(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

/// A configured run whose result is computed on first access and cached.
#[derive(Debug)]
pub struct SavingPlan<'s> {
    series: &'s PriceSeries,
    config: PlanConfig,
    result: OnceLock<Result<SavingPlanResult, SimError>>,
}

impl<'s> SavingPlan<'s> {
    /// Validate `config` and bind it to `series`. Nothing is computed yet.
    pub fn new(series: &'s PriceSeries, config: PlanConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            series,
            config,
            result: OnceLock::new(),
        })
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    pub fn is_computed(&self) -> bool {
        self.result.get().is_some()
    }

    pub fn result(&self) -> Result<&SavingPlanResult, SimError> {
        self.result
            .get_or_init(|| run_plan(self.series, &self.config))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn rows(&self) -> Result<&[ResultRow], SimError> {
        self.result().map(SavingPlanResult::rows)
    }

    pub fn total_worth(&self) -> Result<f64, SimError> {
        self.result().map(SavingPlanResult::total_worth)
    }

    pub fn into_result(self) -> Result<SavingPlanResult, SimError> {
        match self.result.into_inner() {
            Some(result) => result,
            None => run_plan(self.series, &self.config),
        }
    }
}

/// Run one saving plan eagerly.
pub fn simulate(series: &PriceSeries, config: &PlanConfig) -> Result<SavingPlanResult, SimError> {
    config.validate()?;
    run_plan(series, config)
}

/// Pipeline body; `config` is already validated.
fn run_plan(series: &PriceSeries, config: &PlanConfig) -> Result<SavingPlanResult, SimError> {
    let empty = || SimError::EmptyResult {
        target_day: config.target_day,
        period: config.period,
    };

    let points = series.window(&config.period);
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Err(empty());
    };
    let (start_month, end_month) = match config.period {
        Period::Max => (YearMonth::of(first.date), YearMonth::of(last.date)),
        Period::Range { start, end } => (YearMonth::of(start), YearMonth::of(end)),
    };

    let mut rows = Vec::new();
    let mut cumulative_units = 0.0;

    for group in month_groups(points) {
        if is_trimmed(&group, config, start_month, end_month) {
            log::trace!(
                "day {}: skipping boundary month {}",
                config.target_day,
                group.month()
            );
            continue;
        }

        let point = select_purchase(&group, config.target_day)?;
        let bought_units = config.invest_amount / point.close;
        cumulative_units += bought_units;
        log::trace!(
            "day {}: bought {:.6} units at {:.4} on {}",
            config.target_day,
            bought_units,
            point.close,
            point.date
        );

        rows.push(ResultRow {
            date: point.date,
            close: point.close,
            bought_units,
            cumulative_units,
            total_worth: cumulative_units * point.close,
            target_day: config.target_day,
        });
    }

    if rows.is_empty() {
        return Err(empty());
    }

    Ok(SavingPlanResult {
        config: *config,
        rows,
    })
}

fn is_trimmed(
    group: &MonthGroup<'_>,
    config: &PlanConfig,
    start_month: YearMonth,
    end_month: YearMonth,
) -> bool {
    let month = group.month();
    let drop_first = config.first_month == FirstMonthPolicy::Drop
        && month == start_month
        && config.target_day < group.min_day();
    let drop_last = month == end_month && config.target_day > group.max_day();
    drop_first || drop_last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::trading_days;
    use crate::domain::PricePoint;
    use approx::assert_relative_eq;
    use chrono::Datelike;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Weekday series whose close is `f(index)`.
    fn weekday_series(start: NaiveDate, end: NaiveDate, f: impl Fn(usize) -> f64) -> PriceSeries {
        PriceSeries::new(
            trading_days(start, end)
                .enumerate()
                .map(|(i, date)| PricePoint::new(date, f(i)))
                .collect(),
        )
    }

    fn range(start: NaiveDate, end: NaiveDate) -> Period {
        Period::range(start, end).unwrap()
    }

    #[test]
    fn single_month_example() {
        let series = PriceSeries::new(
            (1..=5)
                .map(|day| PricePoint::new(d(2021, 1, day), 10.0 * f64::from(day)))
                .collect(),
        );
        let config = PlanConfig::new(100.0, 1, range(d(2021, 1, 1), d(2021, 1, 5)));
        let result = simulate(&series, &config).unwrap();

        assert_eq!(result.purchases(), 1);
        let row = result.rows()[0];
        assert_eq!(row.date, d(2021, 1, 1));
        assert_relative_eq!(row.bought_units, 10.0);
        assert_relative_eq!(result.total_worth(), 100.0);
    }

    #[test]
    fn buys_on_target_day_when_it_trades_every_month() {
        // One point on the 5th and one on the 20th of every month.
        let mut points = Vec::new();
        for m in 1..=12 {
            points.push(PricePoint::new(d(2019, m, 5), 10.0 + f64::from(m)));
            points.push(PricePoint::new(d(2019, m, 20), 50.0));
        }
        let series = PriceSeries::new(points);
        let result = simulate(&series, &PlanConfig::new(100.0, 5, Period::Max)).unwrap();

        assert_eq!(result.purchases(), 12);
        for (i, row) in result.rows().iter().enumerate() {
            assert_eq!(row.date, d(2019, i as u32 + 1, 5));
            assert_eq!(row.target_day, 5);
        }
    }

    #[test]
    fn day_31_uses_last_trading_day_of_short_months() {
        let series = weekday_series(d(2023, 1, 1), d(2023, 12, 31), |_| 100.0);
        let result = simulate(&series, &PlanConfig::new(100.0, 31, Period::Max)).unwrap();

        let feb = result
            .rows()
            .iter()
            .find(|r| r.date.month() == 2)
            .unwrap();
        assert_eq!(feb.date, d(2023, 2, 28));
        assert!(result.rows().iter().all(|r| r.date.month() != 3 || r.date.day() == 31));
        // One purchase per month. December ends on Friday the 29th, so the
        // last month is trimmed for day 31.
        let months: Vec<u32> = result.rows().iter().map(|r| r.date.month()).collect();
        assert_eq!(months, (1..=11).collect::<Vec<_>>());
    }

    #[test]
    fn first_month_policy_variants() {
        // Period starts on the 10th; target day 5 is before any day of the first month.
        let series = weekday_series(d(2024, 1, 1), d(2024, 6, 30), |_| 100.0);
        let period = range(d(2024, 1, 10), d(2024, 6, 30));

        let dropped = simulate(&series, &PlanConfig::new(100.0, 5, period)).unwrap();
        assert_eq!(dropped.first_purchase(), Some(d(2024, 2, 5)));
        assert_eq!(dropped.purchases(), 5);

        let kept = simulate(
            &series,
            &PlanConfig::new(100.0, 5, period).with_first_month(FirstMonthPolicy::Keep),
        )
        .unwrap();
        assert_eq!(kept.first_purchase(), Some(d(2024, 1, 10)));
        assert_eq!(kept.purchases(), 6);

        // The default configuration is the dropping variant.
        assert_eq!(PlanConfig::new(100.0, 5, period).first_month, FirstMonthPolicy::Drop);
    }

    #[test]
    fn first_month_is_kept_when_target_is_reachable() {
        let series = weekday_series(d(2024, 1, 1), d(2024, 3, 31), |_| 100.0);
        let period = range(d(2024, 1, 10), d(2024, 3, 31));
        let result = simulate(&series, &PlanConfig::new(100.0, 15, period)).unwrap();
        assert_eq!(result.first_purchase(), Some(d(2024, 1, 15)));
        // Equal to the first available day is not "before" it.
        let on_start = simulate(&series, &PlanConfig::new(100.0, 10, period)).unwrap();
        assert_eq!(on_start.first_purchase(), Some(d(2024, 1, 10)));
    }

    #[test]
    fn last_month_is_dropped_when_target_is_past_the_data() {
        let series = weekday_series(d(2024, 1, 1), d(2024, 12, 31), |_| 100.0);
        let period = range(d(2024, 1, 1), d(2024, 3, 20));

        let late = simulate(&series, &PlanConfig::new(100.0, 25, period)).unwrap();
        assert_eq!(late.last_purchase(), Some(d(2024, 2, 26)));
        assert_eq!(late.purchases(), 2);

        let early = simulate(&series, &PlanConfig::new(100.0, 15, period)).unwrap();
        assert_eq!(early.last_purchase(), Some(d(2024, 3, 15)));
        assert_eq!(early.purchases(), 3);
    }

    #[test]
    fn max_period_trims_against_series_bounds() {
        // Data ends on Wednesday 2024-03-13.
        let series = weekday_series(d(2024, 1, 1), d(2024, 3, 13), |_| 100.0);
        let result = simulate(&series, &PlanConfig::new(100.0, 20, Period::Max)).unwrap();
        assert_eq!(result.last_purchase(), Some(d(2024, 2, 20)));
    }

    #[test]
    fn units_accumulate_and_worth_marks_to_market() {
        let series = weekday_series(d(2020, 1, 1), d(2020, 12, 31), |i| 50.0 + i as f64 * 0.5);
        let result = simulate(&series, &PlanConfig::new(250.0, 12, Period::Max)).unwrap();

        let mut previous = 0.0;
        for row in result.rows() {
            assert_relative_eq!(row.bought_units, 250.0 / row.close);
            assert_relative_eq!(row.cumulative_units, previous + row.bought_units);
            assert_relative_eq!(row.total_worth, row.cumulative_units * row.close);
            assert!(row.cumulative_units > previous);
            previous = row.cumulative_units;
        }
        let last = result.rows().last().unwrap();
        assert_relative_eq!(result.total_worth(), last.cumulative_units * last.close);
        assert_relative_eq!(result.total_invested(), 250.0 * 12.0);
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let series = weekday_series(d(2020, 1, 1), d(2020, 3, 31), |_| 1.0);
        for config in [
            PlanConfig::new(100.0, 0, Period::Max),
            PlanConfig::new(100.0, 32, Period::Max),
            PlanConfig::new(0.0, 5, Period::Max),
            PlanConfig::new(100.0, 5, Period::Range {
                start: d(2020, 3, 1),
                end: d(2020, 1, 1),
            }),
        ] {
            assert!(matches!(simulate(&series, &config), Err(SimError::InvalidConfig(_))));
            assert!(matches!(SavingPlan::new(&series, config), Err(SimError::InvalidConfig(_))));
        }
    }

    #[test]
    fn empty_result_when_nothing_survives() {
        let series = weekday_series(d(2020, 1, 1), d(2020, 3, 31), |_| 1.0);

        // Outside the data.
        let outside = PlanConfig::new(100.0, 5, range(d(2021, 1, 1), d(2021, 6, 30)));
        assert!(matches!(simulate(&series, &outside), Err(SimError::EmptyResult { .. })));

        // Mid-month sliver: day 5 is before the 10th (dropped), day 25 after the 20th (dropped).
        let sliver = range(d(2020, 2, 10), d(2020, 2, 20));
        for day in [5, 25] {
            let err = simulate(&series, &PlanConfig::new(100.0, day, sliver)).unwrap_err();
            assert_eq!(
                err,
                SimError::EmptyResult {
                    target_day: day,
                    period: sliver
                }
            );
        }
        assert!(simulate(&series, &PlanConfig::new(100.0, 12, sliver)).is_ok());
    }

    #[test]
    fn lazy_plan_computes_once_and_caches() {
        let series = weekday_series(d(2020, 1, 1), d(2020, 6, 30), |i| 10.0 + i as f64);
        let plan = SavingPlan::new(&series, PlanConfig::new(100.0, 3, Period::Max)).unwrap();
        assert!(!plan.is_computed());

        let first = plan.result().unwrap();
        assert!(plan.is_computed());
        let second = plan.result().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_relative_eq!(plan.total_worth().unwrap(), first.total_worth());

        let owned = plan.into_result().unwrap();
        assert_eq!(owned.purchases(), 6);
    }

    #[test]
    fn lazy_plan_caches_errors_too() {
        let series = weekday_series(d(2020, 1, 1), d(2020, 1, 31), |_| 1.0);
        let period = range(d(2022, 1, 1), d(2022, 12, 31));
        let plan = SavingPlan::new(&series, PlanConfig::new(100.0, 3, period)).unwrap();
        assert!(plan.rows().is_err());
        assert!(plan.is_computed());
        assert_eq!(plan.rows().unwrap_err(), plan.total_worth().unwrap_err());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let series = weekday_series(d(2010, 1, 1), d(2012, 12, 31), |i| 100.0 + (i as f64).sin() * 5.0);
        let config = PlanConfig::new(75.0, 17, Period::Max);
        let a = simulate(&series, &config).unwrap();
        let b = simulate(&series, &config).unwrap();
        assert_eq!(a.rows(), b.rows());
        assert_eq!(
            serde_json::to_string(a.rows()).unwrap(),
            serde_json::to_string(b.rows()).unwrap()
        );
    }

    proptest! {
        #[test]
        fn invariants_hold_for_random_series(
            closes in prop::collection::vec(1.0f64..500.0, 40..400),
            skip_mask in prop::collection::vec(any::<bool>(), 400),
            target_day in 1u32..=31,
            amount in 1.0f64..10_000.0,
        ) {
            let points: Vec<PricePoint> = trading_days(d(2015, 1, 1), d(2016, 12, 31))
                .zip(closes.iter())
                .enumerate()
                .filter(|(i, _)| *i == 0 || !skip_mask[*i % skip_mask.len()])
                .map(|(_, (date, &close))| PricePoint::new(date, close))
                .collect();
            let series = PriceSeries::new(points);

            match simulate(&series, &PlanConfig::new(amount, target_day, Period::Max)) {
                Ok(result) => {
                    let mut previous: Option<ResultRow> = None;
                    for row in result.rows() {
                        prop_assert!((row.bought_units - amount / row.close).abs() < 1e-9 * row.bought_units.max(1.0));
                        prop_assert!((row.total_worth - row.cumulative_units * row.close).abs() <= 1e-9 * row.total_worth.max(1.0));
                        if let Some(prev) = previous {
                            prop_assert!(row.date > prev.date);
                            prop_assert!(YearMonth::of(row.date) > YearMonth::of(prev.date));
                            prop_assert!(row.cumulative_units > prev.cumulative_units);
                        }
                        previous = Some(*row);
                    }
                    let last = result.rows().last().unwrap();
                    prop_assert_eq!(result.total_worth(), last.total_worth);
                }
                Err(err) => prop_assert!(err.is_skippable(), "unexpected error: {}", err),
            }
        }
    }
}
