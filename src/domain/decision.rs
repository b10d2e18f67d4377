//! Decision rules that turn indicator histories into trade signals.
//!
//! # Evaluation Semantics
//!
//! - `WeightedCrossing`: buy fires when the buy-weighted sum of indicator values
//!   crosses from `<= 0` to `> 0`; sell fires the same way on the sell-weighted sum
//! - Crossings require `index >= 1` and defined values at both `index - 1` and `index`
//! - `Bound`: a caller-supplied closure with the `(history, index) -> Decision` contract
//! - `RandomTrigger`: ignores the indicators; each step fires the legal signal with
//!   probability `prob`, drawing from its own seeded stream. Used as a baseline.
//!
//! The engine passes the current position so a rule can only ever produce the
//! signal that is legal in that state.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use rand::Rng;
use rand::rngs::StdRng;

use crate::domain::error::GenetraderError;
use crate::domain::indicator::IndicatorSeries;

/// Trigger probability of the random baseline: roughly one trade every 20 bars.
pub const DEFAULT_RANDOM_TRIGGER_PROB: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Flat,
    Long,
}

/// Everything a decision rule may read: materialised indicator values plus the free constant genes.
#[derive(Debug, Clone, Copy)]
pub struct History<'a> {
    pub indicators: &'a [IndicatorSeries],
    pub constants: &'a [f64],
}

impl<'a> History<'a> {
    pub fn new(indicators: &'a [IndicatorSeries], constants: &'a [f64]) -> Self {
        History {
            indicators,
            constants,
        }
    }

    /// Σ weights[i] * indicators[i][index]; `None` if any weighted value is undefined.
    pub fn weighted_sum(&self, weights: &[f64], index: usize) -> Option<f64> {
        if weights.len() != self.indicators.len() {
            return None;
        }
        self.indicators
            .iter()
            .zip(weights)
            .try_fold(0.0, |acc, (series, w)| series.value_at(index).map(|v| acc + w * v))
    }

    /// True when the weighted sum is `<= 0` at `index - 1` and `> 0` at `index`.
    pub fn crosses_above_zero(&self, weights: &[f64], index: usize) -> bool {
        if index == 0 {
            return false;
        }
        match (
            self.weighted_sum(weights, index - 1),
            self.weighted_sum(weights, index),
        ) {
            (Some(prev), Some(curr)) => curr > 0.0 && prev <= 0.0,
            _ => false,
        }
    }
}

pub type TriggerFn = dyn Fn(&History<'_>, usize) -> Decision + Send + Sync;

#[derive(Clone)]
pub enum DecisionRule {
    /// Buy weights are `constants[..n]`, sell weights `constants[n..2n]` for `n` catalog slots.
    WeightedCrossing,
    Bound { name: String, trigger: Arc<TriggerFn> },
    /// Stateful: clones share one stream, so build a fresh rule per reproducible run.
    RandomTrigger { prob: f64, rng: Arc<Mutex<StdRng>> },
}

impl DecisionRule {
    pub fn bound<F>(name: &str, trigger: F) -> Self
    where
        F: Fn(&History<'_>, usize) -> Decision + Send + Sync + 'static,
    {
        DecisionRule::Bound {
            name: name.to_string(),
            trigger: Arc::new(trigger),
        }
    }

    /// Random baseline drawing from `rng`.
    pub fn random_trigger(prob: f64, rng: StdRng) -> Result<Self, GenetraderError> {
        if !(0.0..=1.0).contains(&prob) {
            return Err(GenetraderError::InvalidProbability(prob));
        }
        Ok(DecisionRule::RandomTrigger {
            prob,
            rng: Arc::new(Mutex::new(rng)),
        })
    }

    /// Number of constant genes this rule consumes for a catalog of `slots` indicators,
    /// or `None` when the rule places no requirement on them.
    pub fn required_constants(&self, slots: usize) -> Option<usize> {
        match self {
            DecisionRule::WeightedCrossing => Some(2 * slots),
            DecisionRule::Bound { .. } | DecisionRule::RandomTrigger { .. } => None,
        }
    }

    pub fn decide(&self, history: &History<'_>, index: usize, position: Position) -> Decision {
        match self {
            DecisionRule::WeightedCrossing => {
                let n = history.indicators.len();
                if history.constants.len() < 2 * n {
                    return Decision::Hold;
                }
                let (buy_weights, rest) = history.constants.split_at(n);
                let sell_weights = &rest[..n];
                match position {
                    Position::Flat if history.crosses_above_zero(buy_weights, index) => {
                        Decision::Buy
                    }
                    Position::Long if history.crosses_above_zero(sell_weights, index) => {
                        Decision::Sell
                    }
                    _ => Decision::Hold,
                }
            }
            DecisionRule::Bound { trigger, .. } => trigger(history, index),
            DecisionRule::RandomTrigger { prob, rng } => {
                let draw: f64 = rng
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .gen_range(0.0..1.0);
                match position {
                    _ if draw >= *prob => Decision::Hold,
                    Position::Flat => Decision::Buy,
                    Position::Long => Decision::Sell,
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DecisionRule::WeightedCrossing => "weighted-crossing",
            DecisionRule::Bound { name, .. } => name,
            DecisionRule::RandomTrigger { .. } => "random-trigger",
        }
    }
}

impl fmt::Debug for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionRule::WeightedCrossing => write!(f, "WeightedCrossing"),
            DecisionRule::Bound { name, .. } => {
                f.debug_struct("Bound").field("name", name).finish()
            }
            DecisionRule::RandomTrigger { prob, .. } => {
                f.debug_struct("RandomTrigger").field("prob", prob).finish()
            }
        }
    }
}

impl PartialEq for DecisionRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DecisionRule::WeightedCrossing, DecisionRule::WeightedCrossing) => true,
            (
                DecisionRule::Bound { name: a, trigger: f },
                DecisionRule::Bound { name: b, trigger: g },
            ) => a == b && Arc::ptr_eq(f, g),
            (
                DecisionRule::RandomTrigger { prob: p, rng: a },
                DecisionRule::RandomTrigger { prob: q, rng: b },
            ) => p == q && Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
