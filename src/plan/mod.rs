//! Single saving-plan runs: purchase day selection and unit accumulation.

pub mod engine;
pub mod selector;

pub use engine::{SavingPlan, SavingPlanResult, simulate};
pub use selector::{PurchaseSide, select_purchase};
