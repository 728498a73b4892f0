pub mod baselines;

pub use baselines::*;
