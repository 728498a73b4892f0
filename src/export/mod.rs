//! Presentation of completed runs: CSV rows and a paginated text report.

pub mod csv;
pub mod report;

pub use csv::*;
pub use report::*;
