//! Chromosome: the genome of one candidate strategy.
//!
//! A chromosome holds one parameter set per catalog slot, a pool of free
//! constant genes and the decision rule that reads them. The window and
//! deviation gene arrays are the slots flattened in catalog order, so the
//! three arrays in a [`GenePool`] fully determine a chromosome for a given
//! catalog and rule.

use rand::Rng;

use crate::domain::catalog::Catalog;
use crate::domain::decision::{Decision, DecisionRule, History, Position};
use crate::domain::error::GenetraderError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::{IndicatorFamily, ParameterSet};
use crate::domain::record::StrategyRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct GenePool {
    pub window_sizes: Vec<usize>,
    pub window_devs: Vec<f64>,
    pub constants: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    slots: Vec<ParameterSet>,
    constants: Vec<f64>,
    rule: DecisionRule,
}

impl Chromosome {
    pub fn new(
        catalog: &Catalog,
        slots: Vec<ParameterSet>,
        constants: Vec<f64>,
        rule: DecisionRule,
    ) -> Result<Self, GenetraderError> {
        check_slots(catalog, &slots)?;
        if let Some(expected) = rule.required_constants(catalog.size()) {
            if constants.len() != expected {
                return Err(GenetraderError::GeneCountMismatch {
                    genes: "constants".to_string(),
                    expected,
                    actual: constants.len(),
                });
            }
        }
        Ok(Chromosome {
            slots,
            constants,
            rule,
        })
    }

    /// Rebuild a chromosome from its flattened gene arrays.
    pub fn from_genes(
        catalog: &Catalog,
        genes: &GenePool,
        rule: DecisionRule,
    ) -> Result<Self, GenetraderError> {
        if genes.window_sizes.len() != catalog.size() {
            return Err(GenetraderError::GeneCountMismatch {
                genes: "window_sizes".to_string(),
                expected: catalog.size(),
                actual: genes.window_sizes.len(),
            });
        }
        if genes.window_devs.len() != catalog.deviation_slots() {
            return Err(GenetraderError::GeneCountMismatch {
                genes: "window_devs".to_string(),
                expected: catalog.deviation_slots(),
                actual: genes.window_devs.len(),
            });
        }

        let mut devs = genes.window_devs.iter().copied();
        let slots = catalog
            .iter()
            .zip(&genes.window_sizes)
            .map(|(descriptor, &window)| match descriptor.family() {
                IndicatorFamily::MovingAverage => ParameterSet::MovingAverage { window },
                IndicatorFamily::Bollinger => ParameterSet::Bollinger {
                    window,
                    // length checked above
                    window_dev: devs.next().unwrap_or(f64::NAN),
                },
            })
            .collect();

        Chromosome::new(catalog, slots, genes.constants.clone(), rule)
    }

    /// Fresh chromosome: every slot from its family sampler, constants uniform in
    /// `[-constant_range, constant_range]` rounded to two decimals.
    pub fn random<R: Rng + ?Sized>(
        catalog: &Catalog,
        rule: DecisionRule,
        n_constants: usize,
        constant_range: f64,
        rng: &mut R,
    ) -> Result<Self, GenetraderError> {
        if !constant_range.is_finite() || constant_range <= 0.0 {
            return Err(GenetraderError::invalid_parameter(
                "constants",
                "constant_range",
                format!("constant_range must be finite and positive, got {constant_range}"),
            ));
        }
        let slots = catalog.random_params(rng);
        let constants = (0..n_constants)
            .map(|_| {
                let c: f64 = rng.gen_range(-constant_range..=constant_range);
                (c * 100.0).round() / 100.0
            })
            .collect();
        Chromosome::new(catalog, slots, constants, rule)
    }

    pub fn slots(&self) -> &[ParameterSet] {
        &self.slots
    }

    pub fn constants(&self) -> &[f64] {
        &self.constants
    }

    pub fn rule(&self) -> &DecisionRule {
        &self.rule
    }

    pub fn genes(&self) -> GenePool {
        GenePool {
            window_sizes: self.slots.iter().map(ParameterSet::window).collect(),
            window_devs: self.slots.iter().filter_map(ParameterSet::window_dev).collect(),
            constants: self.constants.clone(),
        }
    }

    /// Independent copy where each slot was replaced by a mutated value with probability `prob`.
    ///
    /// One draw per slot. Constants and the rule are carried over unchanged.
    pub fn mutated<R: Rng + ?Sized>(
        &self,
        prob: f64,
        rng: &mut R,
    ) -> Result<Self, GenetraderError> {
        if !(0.0..=1.0).contains(&prob) {
            return Err(GenetraderError::InvalidProbability(prob));
        }
        let slots = self
            .slots
            .iter()
            .map(|params| {
                let draw: f64 = rng.gen_range(0.0..1.0);
                if draw < prob {
                    params.mutate(rng)
                } else {
                    *params
                }
            })
            .collect();
        Ok(Chromosome {
            slots,
            constants: self.constants.clone(),
            rule: self.rule.clone(),
        })
    }

    /// Materialise every slot's indicator over `bars`, in catalog order.
    pub fn indicator_value_sequences(
        &self,
        catalog: &Catalog,
        bars: &[OhlcvBar],
    ) -> Result<Vec<IndicatorSeries>, GenetraderError> {
        check_slots(catalog, &self.slots)?;
        catalog
            .iter()
            .zip(&self.slots)
            .map(|(descriptor, params)| descriptor.evaluate_bars(bars, params))
            .collect()
    }

    pub fn decide(&self, index: usize, values: &[IndicatorSeries], position: Position) -> Decision {
        let history = History::new(values, &self.constants);
        self.rule.decide(&history, index, position)
    }

    pub fn to_record(&self, fitness: Option<f64>, portfolio: Option<f64>) -> StrategyRecord {
        let genes = self.genes();
        StrategyRecord {
            window_sizes: genes.window_sizes,
            window_devs: genes.window_devs,
            constants: genes.constants,
            fitness,
            portfolio,
        }
    }

    pub fn from_record(
        catalog: &Catalog,
        record: &StrategyRecord,
        rule: DecisionRule,
    ) -> Result<Self, GenetraderError> {
        let genes = GenePool {
            window_sizes: record.window_sizes.clone(),
            window_devs: record.window_devs.clone(),
            constants: record.constants.clone(),
        };
        Chromosome::from_genes(catalog, &genes, rule)
    }
}

fn check_slots(catalog: &Catalog, slots: &[ParameterSet]) -> Result<(), GenetraderError> {
    if slots.len() != catalog.size() {
        return Err(GenetraderError::SlotCountMismatch {
            expected: catalog.size(),
            actual: slots.len(),
        });
    }
    for (slot, (descriptor, params)) in catalog.iter().zip(slots).enumerate() {
        descriptor.check_params(slot, params)?;
    }
    Ok(())
}
