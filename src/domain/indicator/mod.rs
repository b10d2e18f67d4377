//! Technical indicator delegates.
//!
//! This module provides the numeric indicator implementations the catalog binds to:
//! - `IndicatorKind`: identity of a built-in indicator
//! - `IndicatorSeries`: a value sequence aligned to the input index, `None` during warm-up
//! - `sma`, `ema`, `bollinger`: pure, length-preserving calculations over one column

pub mod bollinger;
pub mod ema;
pub mod sma;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma,
    Ema,
    BollingerLower,
    BollingerUpper,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub kind: IndicatorKind,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    /// Value at `index`, or `None` for warm-up and out-of-range indices.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Arithmetic mean of a non-empty window. A window of equal values yields that
/// value exactly, so flat inputs produce flat outputs.
pub(crate) fn window_mean(window: &[f64]) -> f64 {
    match window.split_first() {
        Some((&first, rest)) if rest.iter().all(|&v| v == first) => first,
        _ => window.iter().sum::<f64>() / window.len() as f64,
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma => write!(f, "SMA"),
            IndicatorKind::Ema => write!(f, "EMA"),
            IndicatorKind::BollingerLower => write!(f, "Bollinger_lower"),
            IndicatorKind::BollingerUpper => write!(f, "Bollinger_higher"),
        }
    }
}
