//! Indicator parameter sets and their bounded mutation/sampling rules.
//!
//! Each indicator family owns its domain constraints. Mutation and random
//! initialisation clamp into that domain, so every parameter set they return
//! satisfies [`ParameterSet::validate`].

use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt;

use crate::domain::error::GenetraderError;

/// Standard deviation of a moving-average window mutation step.
pub const MA_WINDOW_SIGMA: f64 = 5.0;
/// Largest absolute moving-average window mutation step.
pub const MA_WINDOW_MAX_STEP: f64 = 10.0;
/// Bollinger steps are drawn with a standard deviation of this fraction of the current value.
pub const BOLLINGER_RELATIVE_SIGMA: f64 = 0.05;

/// Sampling range for moving-average windows (upper bound exclusive).
pub const MA_WINDOW_RANGE: std::ops::Range<usize> = 1..100;
/// Sampling range for Bollinger windows (upper bound exclusive).
pub const BOLLINGER_WINDOW_RANGE: std::ops::Range<usize> = 1..721;
/// Sampling range for Bollinger deviation multipliers (inclusive).
pub const BOLLINGER_DEV_RANGE: std::ops::RangeInclusive<f64> = 1.0..=5.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorFamily {
    MovingAverage,
    Bollinger,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterSet {
    MovingAverage { window: usize },
    Bollinger { window: usize, window_dev: f64 },
}

impl IndicatorFamily {
    /// Draw a fresh parameter set uniformly from the family's sampling domain.
    pub fn random_params<R: Rng + ?Sized>(&self, rng: &mut R) -> ParameterSet {
        match self {
            IndicatorFamily::MovingAverage => ParameterSet::MovingAverage {
                window: rng.gen_range(MA_WINDOW_RANGE),
            },
            IndicatorFamily::Bollinger => {
                let dev: f64 = rng.gen_range(BOLLINGER_DEV_RANGE);
                ParameterSet::Bollinger {
                    window: rng.gen_range(BOLLINGER_WINDOW_RANGE),
                    window_dev: (dev * 10.0).round() / 10.0,
                }
            }
        }
    }

    /// Parameter names, in the order [`ParameterSet::entries`] reports them.
    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            IndicatorFamily::MovingAverage => &["window"],
            IndicatorFamily::Bollinger => &["window", "window_dev"],
        }
    }
}

impl ParameterSet {
    pub fn family(&self) -> IndicatorFamily {
        match self {
            ParameterSet::MovingAverage { .. } => IndicatorFamily::MovingAverage,
            ParameterSet::Bollinger { .. } => IndicatorFamily::Bollinger,
        }
    }

    pub fn window(&self) -> usize {
        match *self {
            ParameterSet::MovingAverage { window } | ParameterSet::Bollinger { window, .. } => {
                window
            }
        }
    }

    pub fn window_dev(&self) -> Option<f64> {
        match *self {
            ParameterSet::MovingAverage { .. } => None,
            ParameterSet::Bollinger { window_dev, .. } => Some(window_dev),
        }
    }

    /// Look a parameter up by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        match (self, name) {
            (_, "window") => Some(self.window() as f64),
            (ParameterSet::Bollinger { window_dev, .. }, "window_dev") => Some(*window_dev),
            _ => None,
        }
    }

    /// All (name, value) pairs of this set.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        self.family()
            .param_names()
            .iter()
            .filter_map(|name| self.get(name).map(|v| (*name, v)))
            .collect()
    }

    /// Return a mutated copy: a zero-mean Gaussian step per parameter, re-clamped to the domain.
    pub fn mutate<R: Rng + ?Sized>(&self, rng: &mut R) -> ParameterSet {
        match *self {
            ParameterSet::MovingAverage { window } => {
                let step = gaussian(rng, MA_WINDOW_SIGMA)
                    .clamp(-MA_WINDOW_MAX_STEP, MA_WINDOW_MAX_STEP);
                ParameterSet::MovingAverage {
                    window: clamp_window(window as f64 + step),
                }
            }
            ParameterSet::Bollinger { window, window_dev } => {
                let window_step = gaussian(rng, window as f64 * BOLLINGER_RELATIVE_SIGMA);
                let dev_step = gaussian(rng, window_dev * BOLLINGER_RELATIVE_SIGMA);
                ParameterSet::Bollinger {
                    window: clamp_window(window as f64 + window_step),
                    window_dev: (window_dev + dev_step).max(1.0),
                }
            }
        }
    }

    /// Check the family's domain constraints: window >= 1, window_dev finite and positive.
    pub fn validate(&self, indicator: &str) -> Result<(), GenetraderError> {
        if self.window() < 1 {
            return Err(GenetraderError::invalid_parameter(
                indicator,
                "window",
                "window must be at least 1",
            ));
        }
        if let Some(dev) = self.window_dev() {
            if !dev.is_finite() || dev <= 0.0 {
                return Err(GenetraderError::invalid_parameter(
                    indicator,
                    "window_dev",
                    format!("window_dev must be finite and positive, got {dev}"),
                ));
            }
        }
        Ok(())
    }
}

fn gaussian<R: Rng + ?Sized>(rng: &mut R, sigma: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    z * sigma
}

/// Truncate toward zero, then floor at 1.
fn clamp_window(value: f64) -> usize {
    let truncated = value.trunc();
    if truncated < 1.0 { 1 } else { truncated as usize }
}

impl fmt::Display for IndicatorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorFamily::MovingAverage => write!(f, "moving-average"),
            IndicatorFamily::Bollinger => write!(f, "bollinger"),
        }
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterSet::MovingAverage { window } => write!(f, "window={}", window),
            ParameterSet::Bollinger { window, window_dev } => {
                write!(f, "window={}, window_dev={}", window, window_dev)
            }
        }
    }
}
