//! SalesDesk core: sales aggregation, scenario simulation and report
//! assembly for the company-status dashboard.

pub mod aggregator;
pub mod config;
pub mod dataset;
pub mod error;
pub mod report;
pub mod sample;
pub mod session;
pub mod simulator;
pub mod store;
pub mod types;
