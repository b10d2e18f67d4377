//! Minimal persisted form of an evolved strategy.

use serde::{Deserialize, Serialize};

/// The three gene arrays plus the scores they produced. Field names are the
/// on-disk JSON keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub window_sizes: Vec<usize>,
    pub window_devs: Vec<f64>,
    pub constants: Vec<f64>,
    pub fitness: Option<f64>,
    pub portfolio: Option<f64>,
}
