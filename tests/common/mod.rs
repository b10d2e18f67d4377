#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use genetrader::domain::catalog::Catalog;
use genetrader::domain::chromosome::Chromosome;
use genetrader::domain::decision::DecisionRule;
use genetrader::domain::error::GenetraderError;
pub use genetrader::domain::ohlcv::OhlcvBar;
use genetrader::domain::params::ParameterSet;
use genetrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, market: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(market.to_string(), bars);
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(&self, market: &str) -> Result<Vec<OhlcvBar>, GenetraderError> {
        match self.data.get(market) {
            Some(bars) if !bars.is_empty() => Ok(bars.clone()),
            _ => Err(GenetraderError::NoData {
                market: market.to_string(),
            }),
        }
    }

    fn list_markets(&self) -> Result<Vec<String>, GenetraderError> {
        let mut markets: Vec<String> = self.data.keys().cloned().collect();
        markets.sort();
        Ok(markets)
    }
}

pub fn make_bar(date: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        date,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1000.0,
    }
}

/// Daily bars starting 2024-01-01, one per close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(start + Duration::days(i as i64), c))
        .collect()
}

/// Deterministic wavy series that triggers plenty of crossings.
pub fn wavy_closes(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            100.0 + 10.0 * (t / 5.0).sin() + 3.0 * (t / 1.7).cos() + 0.05 * t
        })
        .collect()
}

pub fn builtin_slots(
    sma: usize,
    ema: usize,
    lower: (usize, f64),
    upper: (usize, f64),
) -> Vec<ParameterSet> {
    vec![
        ParameterSet::MovingAverage { window: sma },
        ParameterSet::MovingAverage { window: ema },
        ParameterSet::Bollinger {
            window: lower.0,
            window_dev: lower.1,
        },
        ParameterSet::Bollinger {
            window: upper.0,
            window_dev: upper.1,
        },
    ]
}

/// Weighted-crossing chromosome over the builtin catalog.
pub fn crossing_chromosome(slots: Vec<ParameterSet>, constants: Vec<f64>) -> Chromosome {
    Chromosome::new(
        &Catalog::builtin(),
        slots,
        constants,
        DecisionRule::WeightedCrossing,
    )
    .unwrap()
}

pub const SAMPLE_INI: &str = "\
[data]
path = DATA_DIR
market = TEST-AUD

[backtest]
initial_capital = 100
fee = 0.02

[evolution]
seed = 42
mutation_prob = 0.5
constant_range = 1.0
workers = 3
";

/// Write `<dir>/<market>.csv` in the data adapter's format.
pub fn write_market_csv(dir: &std::path::Path, market: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(dir.join(format!("{market}.csv")), content).unwrap();
}
