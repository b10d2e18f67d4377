//! Backtest engine: single-pass fitness evaluation of one chromosome.
//!
//! The simulation alternates strictly between two states:
//! - `Flat`: all capital held in the quote currency
//! - `Long`: all capital held in the base currency
//!
//! Every conversion pays a proportional fee on the amount being converted.
//! A position still open at the last bar is liquidated at the last close,
//! and the resulting quote balance is the fitness.

use log::debug;

use crate::domain::catalog::Catalog;
use crate::domain::chromosome::Chromosome;
use crate::domain::decision::{Decision, Position};
use crate::domain::error::GenetraderError;
use crate::domain::ohlcv::{column, OhlcvBar, PriceField};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100.0;
pub const DEFAULT_FEE: f64 = 0.02;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Fraction of each converted amount lost to costs.
    pub fee: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            fee: DEFAULT_FEE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// A realised conversion. `quote` and `base` are the balances after the trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub index: usize,
    pub side: Side,
    pub price: f64,
    pub quote: f64,
    pub base: f64,
    pub forced: bool,
}

/// Mutable state owned by a single evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub quote: f64,
    pub base: f64,
    pub buys: usize,
    pub sells: usize,
    pub events: Vec<TradeEvent>,
    pub trace: Option<Vec<f64>>,
    position: Position,
    fee: f64,
}

impl SimulationState {
    pub fn new(config: &BacktestConfig, record_trace: bool) -> Self {
        SimulationState {
            quote: config.initial_capital,
            base: 0.0,
            buys: 0,
            sells: 0,
            events: Vec::new(),
            trace: record_trace.then(|| vec![config.initial_capital]),
            position: Position::Flat,
            fee: config.fee,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Convert the whole quote balance to base: `base = quote * (1 - fee) / price`.
    pub fn buy(&mut self, index: usize, price: f64) {
        debug_assert_eq!(self.position, Position::Flat);
        self.record(self.quote);
        self.base = self.quote * (1.0 - self.fee) / price;
        self.quote = 0.0;
        self.position = Position::Long;
        self.buys += 1;
        self.push_event(index, Side::Buy, price, false);
    }

    /// Convert the whole base balance to quote: `quote = base * (1 - fee) * price`.
    pub fn sell(&mut self, index: usize, price: f64, forced: bool) {
        debug_assert_eq!(self.position, Position::Long);
        self.quote = self.base * (1.0 - self.fee) * price;
        self.base = 0.0;
        self.position = Position::Flat;
        self.sells += 1;
        self.record(self.quote);
        self.push_event(index, Side::Sell, price, forced);
    }

    /// Record mark-to-market value without touching balances.
    pub fn hold(&mut self, price: f64) {
        let value = self.quote + self.base * price;
        self.record(value);
    }

    fn record(&mut self, value: f64) {
        if let Some(trace) = self.trace.as_mut() {
            trace.push(value);
        }
    }

    fn push_event(&mut self, index: usize, side: Side, price: f64, forced: bool) {
        debug!(
            "{:?} at index {} price {:.4}: quote={:.4} base={:.6}{}",
            side,
            index,
            price,
            self.quote,
            self.base,
            if forced { " (forced)" } else { "" }
        );
        self.events.push(TradeEvent {
            index,
            side,
            price,
            quote: self.quote,
            base: self.base,
            forced,
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub fitness: f64,
    pub buys: usize,
    pub sells: usize,
    pub events: Vec<TradeEvent>,
    pub trace: Option<Vec<f64>>,
}

/// Run the state machine over `closes`, asking `decide` for a signal at every index from 1.
///
/// Signals that are illegal in the current position are ignored.
pub fn simulate<F>(
    closes: &[f64],
    config: &BacktestConfig,
    record_trace: bool,
    mut decide: F,
) -> BacktestResult
where
    F: FnMut(usize, Position) -> Decision,
{
    let mut state = SimulationState::new(config, record_trace);

    for (t, &price) in closes.iter().enumerate().skip(1) {
        match (state.position(), decide(t, state.position())) {
            (Position::Flat, Decision::Buy) => state.buy(t, price),
            (Position::Long, Decision::Sell) => state.sell(t, price, false),
            _ => state.hold(price),
        }
    }

    if state.position() == Position::Long {
        if let Some((last, &price)) = closes.iter().enumerate().last() {
            state.sell(last, price, true);
        }
    }

    debug!(
        "backtest finished: fitness={:.4} buys={} sells={}",
        state.quote, state.buys, state.sells
    );

    BacktestResult {
        fitness: state.quote,
        buys: state.buys,
        sells: state.sells,
        events: state.events,
        trace: state.trace,
    }
}

/// Evaluate `chromosome` against `bars`.
///
/// Shape errors surface before any simulation step runs.
pub fn run_backtest(
    chromosome: &Chromosome,
    catalog: &Catalog,
    bars: &[OhlcvBar],
    config: &BacktestConfig,
    record_trace: bool,
) -> Result<BacktestResult, GenetraderError> {
    let values = chromosome.indicator_value_sequences(catalog, bars)?;
    let closes = column(bars, PriceField::Close);
    Ok(simulate(&closes, config, record_trace, |t, position| {
        chromosome.decide(t, &values, position)
    }))
}
