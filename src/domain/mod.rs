//! Core domain types and logic.

pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod price;
pub mod returns;
pub mod signal;
pub mod stats;
