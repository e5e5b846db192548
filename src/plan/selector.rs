//! Investment day selection.
//!
//! For one calendar month and a target day `d`, pick the single trading day
//! used for that month's purchase:
//!
//! - `diff = day - d` for every point of the month
//! - if `d` is before the month's last available day, keep `diff >= 0`
//!   (first trading day on or after the target)
//! - otherwise keep `diff <= 0` (closest trading day not after the month end)
//! - among the kept points, the one with minimal `|diff|` wins
//!
//! More than one winner means the month has duplicate days; that is reported
//! as [`SimError::AmbiguousSelection`] instead of picking one arbitrarily.

use chrono::Datelike;

use crate::domain::{MonthGroup, PricePoint};
use crate::error::SimError;

/// Which side of the target day a month's purchase is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseSide {
    OnOrAfter,
    OnOrBefore,
}

impl PurchaseSide {
    pub fn resolve(target_day: u32, max_day: u32) -> Self {
        if target_day < max_day {
            PurchaseSide::OnOrAfter
        } else {
            PurchaseSide::OnOrBefore
        }
    }

    fn admits(self, diff: i64) -> bool {
        match self {
            PurchaseSide::OnOrAfter => diff >= 0,
            PurchaseSide::OnOrBefore => diff <= 0,
        }
    }
}

/// Pick the purchase point of `group` for `target_day`.
pub fn select_purchase<'a>(
    group: &MonthGroup<'a>,
    target_day: u32,
) -> Result<&'a PricePoint, SimError> {
    let side = PurchaseSide::resolve(target_day, group.max_day());
    let diff = |p: &PricePoint| i64::from(p.date.day()) - i64::from(target_day);

    let retained = group.points().iter().filter(|p| side.admits(diff(*p)));
    let min_abs = retained.clone().map(|p| diff(p).abs()).min();

    let ambiguous = |candidates: usize| SimError::AmbiguousSelection {
        year: group.month().year,
        month: group.month().month,
        target_day,
        candidates,
    };

    let Some(min_abs) = min_abs else {
        return Err(ambiguous(0));
    };

    let mut closest = retained.filter(|p| diff(*p).abs() == min_abs);
    match (closest.next(), closest.next()) {
        (Some(point), None) => Ok(point),
        (Some(_), Some(_)) => Err(ambiguous(2 + closest.count())),
        (None, _) => Err(ambiguous(0)),
    }
}
