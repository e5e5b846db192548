//! `saving-plan-days` library crate.
//!
//! Simulates a monthly saving plan against a daily price series and measures
//! how much the chosen day of month matters. The binary (`spd`) is a thin
//! wrapper around this library so that:
//!
//! - the engine and sweeps are testable without spawning processes
//! - sweeps can be driven with custom result sinks and cancellation

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plan;
pub mod report;
pub mod sweep;
