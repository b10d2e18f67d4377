//! Indicator catalog: the fixed, ordered registry chromosome slots bind to.
//!
//! Slot `i` of every chromosome holds the parameters for `descriptor(i)`.
//! Registration order is fixed when the catalog is built and never changes.

use rand::Rng;
use std::collections::HashSet;

use crate::domain::error::GenetraderError;
use crate::domain::indicator::bollinger::{calculate_lower_band, calculate_upper_band};
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorKind, IndicatorSeries};
use crate::domain::ohlcv::{column, OhlcvBar, PriceField};
use crate::domain::params::{IndicatorFamily, ParameterSet};

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorDescriptor {
    pub name: String,
    pub input_fields: Vec<PriceField>,
    pub kind: IndicatorKind,
}

impl IndicatorDescriptor {
    pub fn new(name: &str, input_fields: Vec<PriceField>, kind: IndicatorKind) -> Self {
        IndicatorDescriptor {
            name: name.to_string(),
            input_fields,
            kind,
        }
    }

    pub fn family(&self) -> IndicatorFamily {
        match self.kind {
            IndicatorKind::Sma | IndicatorKind::Ema => IndicatorFamily::MovingAverage,
            IndicatorKind::BollingerLower | IndicatorKind::BollingerUpper => {
                IndicatorFamily::Bollinger
            }
        }
    }

    /// Check that `params` belongs to this descriptor's family and lies in its domain.
    pub fn check_params(&self, slot: usize, params: &ParameterSet) -> Result<(), GenetraderError> {
        if params.family() != self.family() {
            return Err(GenetraderError::ParameterKindMismatch {
                slot,
                indicator: self.name.clone(),
                expected: self.family().to_string(),
                actual: params.family().to_string(),
            });
        }
        params.validate(&self.name)
    }

    /// Run the indicator over pre-sliced input columns (one per `input_fields` entry).
    pub fn evaluate(
        &self,
        columns: &[Vec<f64>],
        params: &ParameterSet,
    ) -> Result<IndicatorSeries, GenetraderError> {
        if columns.len() != self.input_fields.len() {
            return Err(GenetraderError::Data {
                reason: format!(
                    "{} takes {} input columns, got {}",
                    self.name,
                    self.input_fields.len(),
                    columns.len()
                ),
            });
        }
        self.check_params(0, params)?;

        let input = columns.first().map(Vec::as_slice).unwrap_or(&[]);
        let window = params.window();
        let values = match (self.kind, params.window_dev()) {
            (IndicatorKind::Sma, _) => calculate_sma(input, window),
            (IndicatorKind::Ema, _) => calculate_ema(input, window),
            (IndicatorKind::BollingerLower, Some(dev)) => calculate_lower_band(input, window, dev),
            (IndicatorKind::BollingerUpper, Some(dev)) => calculate_upper_band(input, window, dev),
            (_, None) => {
                return Err(GenetraderError::invalid_parameter(
                    &self.name,
                    "window_dev",
                    "missing deviation multiplier",
                ));
            }
        };

        Ok(IndicatorSeries {
            kind: self.kind,
            values,
        })
    }

    /// Slice the requested columns out of `bars` and evaluate.
    pub fn evaluate_bars(
        &self,
        bars: &[OhlcvBar],
        params: &ParameterSet,
    ) -> Result<IndicatorSeries, GenetraderError> {
        let columns: Vec<Vec<f64>> = self
            .input_fields
            .iter()
            .map(|&field| column(bars, field))
            .collect();
        self.evaluate(&columns, params)
    }

    pub fn mutate<R: Rng + ?Sized>(
        &self,
        params: &ParameterSet,
        rng: &mut R,
    ) -> Result<ParameterSet, GenetraderError> {
        self.check_params(0, params)?;
        Ok(params.mutate(rng))
    }

    pub fn random_params<R: Rng + ?Sized>(&self, rng: &mut R) -> ParameterSet {
        self.family().random_params(rng)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    descriptors: Vec<IndicatorDescriptor>,
}

impl Catalog {
    pub fn new(descriptors: Vec<IndicatorDescriptor>) -> Result<Self, GenetraderError> {
        if descriptors.is_empty() {
            return Err(GenetraderError::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        for d in &descriptors {
            if !seen.insert(d.name.as_str()) {
                return Err(GenetraderError::DuplicateIndicator {
                    name: d.name.clone(),
                });
            }
        }
        Ok(Catalog { descriptors })
    }

    /// SMA, EMA, lower and upper Bollinger band, all over the close column.
    pub fn builtin() -> Self {
        Catalog {
            descriptors: vec![
                IndicatorDescriptor::new("SMA", vec![PriceField::Close], IndicatorKind::Sma),
                IndicatorDescriptor::new("EMA", vec![PriceField::Close], IndicatorKind::Ema),
                IndicatorDescriptor::new(
                    "Bollinger_lower",
                    vec![PriceField::Close],
                    IndicatorKind::BollingerLower,
                ),
                IndicatorDescriptor::new(
                    "Bollinger_higher",
                    vec![PriceField::Close],
                    IndicatorKind::BollingerUpper,
                ),
            ],
        }
    }

    pub fn size(&self) -> usize {
        self.descriptors.len()
    }

    pub fn descriptor(&self, index: usize) -> Option<&IndicatorDescriptor> {
        self.descriptors.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorDescriptor> {
        self.descriptors.iter()
    }

    /// One random parameter set per slot, in catalog order.
    pub fn random_params<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ParameterSet> {
        self.descriptors.iter().map(|d| d.random_params(rng)).collect()
    }

    /// Number of Bollinger-family slots, i.e. the length of the deviation gene array.
    pub fn deviation_slots(&self) -> usize {
        self.descriptors
            .iter()
            .filter(|d| d.family() == IndicatorFamily::Bollinger)
            .count()
    }
}
