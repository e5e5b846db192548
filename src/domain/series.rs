//! The daily price table the engine reads from.

use chrono::Datelike;

use crate::domain::calendar::YearMonth;
use crate::domain::types::{Period, PricePoint};

/// Daily closes ordered by date.
///
/// The series is read-only once built; every simulation borrows sub-slices of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Wrap points that are already ascending by date with unique dates.
    ///
    /// Ordering is assumed, not checked; use [`PriceSeries::from_unsorted`]
    /// when that is not guaranteed.
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self { points }
    }

    /// Sort by date and keep the first point of every duplicated date.
    pub fn from_unsorted(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Months spanned by the series, from the first to the last date's month.
    pub fn month_span(&self) -> Option<(YearMonth, YearMonth)> {
        let first = self.first()?;
        let last = self.last()?;
        Some((YearMonth::of(first.date), YearMonth::of(last.date)))
    }

    /// The points inside `period` (inclusive on both ends).
    pub fn window(&self, period: &Period) -> &[PricePoint] {
        match *period {
            Period::Max => &self.points,
            Period::Range { start, end } => {
                let lo = self.points.partition_point(|p| p.date < start);
                let hi = self.points.partition_point(|p| p.date <= end);
                if lo >= hi { &[] } else { &self.points[lo..hi] }
            }
        }
    }
}

impl From<Vec<PricePoint>> for PriceSeries {
    fn from(points: Vec<PricePoint>) -> Self {
        Self::from_unsorted(points)
    }
}

/// The points of one calendar month. Never empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthGroup<'a> {
    month: YearMonth,
    points: &'a [PricePoint],
}

impl<'a> MonthGroup<'a> {
    /// Returns `None` for an empty slice.
    pub fn new(points: &'a [PricePoint]) -> Option<Self> {
        let first = points.first()?;
        Some(Self {
            month: YearMonth::of(first.date),
            points,
        })
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn points(&self) -> &'a [PricePoint] {
        self.points
    }

    /// Smallest day-of-month present.
    pub fn min_day(&self) -> u32 {
        self.points.iter().map(|p| p.date.day()).min().unwrap_or(1)
    }

    /// Largest day-of-month present.
    pub fn max_day(&self) -> u32 {
        self.points.iter().map(|p| p.date.day()).max().unwrap_or(1)
    }
}

/// Split ascending points into runs sharing the same calendar month.
pub fn month_groups(points: &[PricePoint]) -> impl Iterator<Item = MonthGroup<'_>> {
    points
        .chunk_by(|a, b| YearMonth::of(a.date) == YearMonth::of(b.date))
        .filter_map(MonthGroup::new)
}
