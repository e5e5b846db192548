//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the price table (`PricePoint`, `PriceSeries`) and month grouping
//! - run inputs (`Period`, `PlanConfig`, `FirstMonthPolicy`) and outputs (`ResultRow`)
//! - generated windows (`WindowSpec`) and calendar month arithmetic (`YearMonth`)
//! - front-end configuration structs built from CLI flags

pub mod calendar;
pub mod series;
pub mod types;

pub use calendar::*;
pub use series::*;
pub use types::*;
