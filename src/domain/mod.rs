//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod params;
pub mod catalog;
pub mod decision;
pub mod chromosome;
pub mod backtest;
pub mod record;
pub mod rng;
pub mod config_validation;
pub mod error;
