//! Reporting utilities: formatted terminal output and sweep statistics.

pub mod format;
pub mod stats;

pub use format::*;
pub use stats::*;
