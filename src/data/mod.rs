//! Price data sources other than CSV files.
//!
//! - seeded synthetic price series (`sample`)

pub mod sample;

pub use sample::{SampleData, generate_price_series, trading_days};
