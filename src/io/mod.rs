//! Input/output helpers.
//!
//! - price CSV ingest + validation (`ingest`)
//! - result exports and the checkpointing sweep sink (`export`)
//! - day sweep JSON read/write (`summary`)

pub mod export;
pub mod ingest;
pub mod summary;

pub use export::*;
pub use ingest::*;
pub use summary::*;
