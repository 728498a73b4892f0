pub mod api;
pub mod config;
pub mod controller;
pub mod domain;
pub mod export;
pub mod forecast;
pub mod optimizer;
pub mod repo;
pub mod telemetry;
