//! Core domain types and logic.

pub mod backtest;
pub mod candle;
pub mod config_validation;
pub mod engine;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod risk;
pub mod scorer;
pub mod signal;
pub mod trade;
