//! genetrader: genetic trading-strategy representation and backtest fitness engine.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], and the demo driver in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
