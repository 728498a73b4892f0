pub mod allocation;
pub mod constraints;
pub mod engine;
pub mod tradeoffs;

pub use allocation::{CorrectionMode, DayContext, DayOutcome};
pub use constraints::*;
pub use engine::*;
