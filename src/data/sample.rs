//! Synthetic daily price generation.
//!
//! Closes follow a geometric Brownian motion sampled on weekdays:
//!
//! `ln S(t+1) = ln S(t) + (mu - sigma^2 / 2) dt + sigma sqrt(dt) z`, with `dt = 1/252`.
//!
//! Each weekday is dropped with probability `holiday_prob` (no row, no price
//! step) so generated calendars have holes like real exchange calendars.
//! Output is fully determined by the config, seed included.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{PricePoint, PriceSeries, SampleConfig};
use crate::error::AppError;
use crate::io::ingest::{SeriesStats, compute_stats};

/// Trading days per year used to scale drift and volatility.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone)]
pub struct SampleData {
    pub series: PriceSeries,
    pub stats: SeriesStats,
}

/// Monday to Friday dates between `start` and `end` (inclusive).
pub fn trading_days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
}

pub fn generate_price_series(config: &SampleConfig) -> Result<SampleData, AppError> {
    validate(config)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let dt = 1.0 / TRADING_DAYS_PER_YEAR;
    let step_drift = (config.drift - 0.5 * config.volatility * config.volatility) * dt;
    let step_vol = config.volatility * dt.sqrt();

    let mut points = Vec::new();
    let mut log_price = config.initial_price.ln();

    for date in trading_days(config.start, config.end) {
        // The first day always trades so the series starts at `initial_price`.
        if !points.is_empty() {
            let holiday: f64 = rng.r#gen();
            if holiday < config.holiday_prob {
                continue;
            }
            let z: f64 = normal.sample(&mut rng);
            log_price += step_drift + step_vol * z;
        }
        points.push(PricePoint::new(date, log_price.exp()));
    }

    let series = PriceSeries::new(points);
    let stats = compute_stats(&series)
        .ok_or_else(|| AppError::new(3, "Sample range contains no weekdays."))?;
    log::debug!(
        "generated {} sample prices ({} .. {}, seed {})",
        stats.n_points,
        stats.first_date,
        stats.last_date,
        config.seed
    );

    Ok(SampleData { series, stats })
}

fn validate(config: &SampleConfig) -> Result<(), AppError> {
    if config.start > config.end {
        return Err(AppError::new(
            2,
            format!("Sample start {} is after end {}.", config.start, config.end),
        ));
    }
    if !(config.initial_price.is_finite() && config.initial_price > 0.0) {
        return Err(AppError::new(2, "Initial price must be finite and > 0."));
    }
    if !config.drift.is_finite() {
        return Err(AppError::new(2, "Drift must be finite."));
    }
    if !(config.volatility.is_finite() && config.volatility >= 0.0) {
        return Err(AppError::new(2, "Volatility must be finite and >= 0."));
    }
    if !(0.0..1.0).contains(&config.holiday_prob) {
        return Err(AppError::new(2, "Holiday probability must be in [0, 1)."));
    }
    Ok(())
}
