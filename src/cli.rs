//! CLI definition and dispatch for the evaluate and sample drivers.

use clap::{Parser, Subcommand};
use log::{info, warn};
use rand::Rng;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_strategy_adapter::JsonStrategyAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::catalog::Catalog;
use crate::domain::chromosome::Chromosome;
use crate::domain::config_validation::{
    validate_backtest_config, validate_data_config, validate_evolution_config,
};
use crate::domain::decision::{DecisionRule, DEFAULT_RANDOM_TRIGGER_PROB};
use crate::domain::error::GenetraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::{IndicatorFamily, ParameterSet};
use crate::domain::record::StrategyRecord;
use crate::domain::rng::{entropy_rng, worker_rng};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::strategy_store::StrategyStore;

#[derive(Parser, Debug)]
#[command(name = "genetrader", about = "Genetic trading-strategy evaluator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest stored strategies against the configured market
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategies: PathBuf,
        /// Print the per-step portfolio value trace
        #[arg(long)]
        trace: bool,
    },
    /// Random search over chromosomes, keeping the fittest
    Sample {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short = 'n', long)]
        count: usize,
        #[arg(short, long, default_value_t = 1)]
        keep: usize,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Force the mutation pass on regardless of `evolution.mutate`
        #[arg(long)]
        mutate: bool,
        /// Also run `count` random-trigger baselines for comparison
        #[arg(long)]
        baseline: bool,
        /// Per-step trigger probability of the baseline
        #[arg(long, default_value_t = DEFAULT_RANDOM_TRIGGER_PROB)]
        baseline_prob: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub path: PathBuf,
    pub market: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionSettings {
    pub seed: Option<u64>,
    pub mutation_prob: f64,
    pub constant_range: f64,
    pub workers: usize,
    /// Mutate each sample once and keep the better of parent and child.
    pub mutate: bool,
}

/// A stored strategy together with the result of re-running it.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub index: usize,
    pub chromosome: Chromosome,
    pub result: BacktestResult,
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Evaluate {
            config,
            strategies,
            trace,
        } => run_evaluate(&config, &strategies, trace),
        Command::Sample {
            config,
            count,
            keep,
            output,
            mutate,
            baseline,
            baseline_prob,
        } => run_sample(
            &config,
            count,
            keep,
            output.as_deref(),
            mutate,
            baseline.then_some(baseline_prob),
        ),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, GenetraderError> {
    info!("loading config from {}", path.display());
    FileConfigAdapter::load(path)
}

pub fn build_data_settings(adapter: &dyn ConfigPort) -> Result<DataSettings, GenetraderError> {
    validate_data_config(adapter)?;
    let get = |key: &str| {
        adapter
            .get_string("data", key)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| GenetraderError::ConfigMissing {
                section: "data".into(),
                key: key.into(),
            })
    };
    Ok(DataSettings {
        path: PathBuf::from(get("path")?),
        market: get("market")?,
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, GenetraderError> {
    validate_backtest_config(adapter)?;
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        initial_capital: adapter.get_double(
            "backtest",
            "initial_capital",
            defaults.initial_capital,
        ),
        fee: adapter.get_double("backtest", "fee", defaults.fee),
    })
}

pub fn build_evolution_settings(
    adapter: &dyn ConfigPort,
) -> Result<EvolutionSettings, GenetraderError> {
    validate_evolution_config(adapter)?;
    let seed = adapter
        .get_string("evolution", "seed")
        .and_then(|s| s.trim().parse::<u64>().ok());
    Ok(EvolutionSettings {
        seed,
        mutation_prob: adapter.get_double("evolution", "mutation_prob", 0.5),
        constant_range: adapter.get_double("evolution", "constant_range", 1.0),
        workers: adapter.get_int("evolution", "workers", 1).max(1) as usize,
        mutate: adapter.get_bool("evolution", "mutate", false),
    })
}

/// Rebuild every record with the weighted-crossing rule and backtest it.
///
/// Records whose genes do not fit the catalog are skipped with a warning.
pub fn evaluate_records(
    catalog: &Catalog,
    bars: &[OhlcvBar],
    records: &[StrategyRecord],
    config: &BacktestConfig,
    record_trace: bool,
) -> Result<Vec<Evaluation>, GenetraderError> {
    let mut evaluations = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let chromosome =
            match Chromosome::from_record(catalog, record, DecisionRule::WeightedCrossing) {
                Ok(c) => c,
                Err(e) => {
                    warn!("skipping strategy {}: {}", index, e);
                    continue;
                }
            };
        let result = run_backtest(&chromosome, catalog, bars, config, record_trace)?;
        evaluations.push(Evaluation {
            index,
            chromosome,
            result,
        });
    }
    Ok(evaluations)
}

/// Number of samples handed to each of `workers` workers.
pub fn split_work(count: usize, workers: usize) -> Vec<usize> {
    let workers = workers.max(1);
    (0..workers)
        .map(|w| count / workers + usize::from(w < count % workers))
        .collect()
}

/// Random search: `count` fresh weighted-crossing chromosomes spread over
/// `settings.workers` workers, each drawing from its own stream derived from `run_seed`.
///
/// Returns the `keep` fittest, best first.
pub fn sample_strategies(
    catalog: &Catalog,
    bars: &[OhlcvBar],
    config: &BacktestConfig,
    settings: &EvolutionSettings,
    run_seed: u64,
    count: usize,
    keep: usize,
) -> Result<Vec<(Chromosome, f64)>, GenetraderError> {
    let rule = DecisionRule::WeightedCrossing;
    let n_constants = rule.required_constants(catalog.size()).unwrap_or(0);

    let per_worker: Vec<Vec<(Chromosome, f64)>> = split_work(count, settings.workers)
        .into_par_iter()
        .enumerate()
        .map(|(worker, quota)| -> Result<Vec<(Chromosome, f64)>, GenetraderError> {
            let mut rng = worker_rng(run_seed, worker);
            let mut found = Vec::with_capacity(quota);
            for _ in 0..quota {
                let parent = Chromosome::random(
                    catalog,
                    rule.clone(),
                    n_constants,
                    settings.constant_range,
                    &mut rng,
                )?;
                let parent_fitness = run_backtest(&parent, catalog, bars, config, false)?.fitness;
                if !settings.mutate {
                    found.push((parent, parent_fitness));
                    continue;
                }
                let child = parent.mutated(settings.mutation_prob, &mut rng)?;
                let child_fitness = run_backtest(&child, catalog, bars, config, false)?.fitness;
                if child_fitness > parent_fitness {
                    found.push((child, child_fitness));
                } else {
                    found.push((parent, parent_fitness));
                }
            }
            Ok(found)
        })
        .collect::<Result<_, _>>()?;

    let mut all: Vec<(Chromosome, f64)> = per_worker.into_iter().flatten().collect();
    all.sort_by(|a, b| b.1.total_cmp(&a.1));
    all.truncate(keep);
    Ok(all)
}

/// Baseline streams sit above any realistic worker index of the same run.
const BASELINE_STREAM_OFFSET: usize = 1 << 20;

/// Smallest valid parameters for every slot. The random trigger never reads them.
fn baseline_slots(catalog: &Catalog) -> Vec<ParameterSet> {
    catalog
        .iter()
        .map(|d| match d.family() {
            IndicatorFamily::MovingAverage => ParameterSet::MovingAverage { window: 1 },
            IndicatorFamily::Bollinger => ParameterSet::Bollinger {
                window: 1,
                window_dev: 1.0,
            },
        })
        .collect()
}

/// Fitness of `runs` random-trigger strategies, run `i` drawing from its own
/// stream derived from `run_seed`.
pub fn baseline_fitness(
    catalog: &Catalog,
    bars: &[OhlcvBar],
    config: &BacktestConfig,
    prob: f64,
    run_seed: u64,
    runs: usize,
) -> Result<Vec<f64>, GenetraderError> {
    (0..runs)
        .into_par_iter()
        .map(|i| -> Result<f64, GenetraderError> {
            let rng = worker_rng(run_seed, BASELINE_STREAM_OFFSET + i);
            let rule = DecisionRule::random_trigger(prob, rng)?;
            let chromosome =
                Chromosome::new(catalog, baseline_slots(catalog), Vec::new(), rule)?;
            Ok(run_backtest(&chromosome, catalog, bars, config, false)?.fitness)
        })
        .collect()
}

fn load_market(settings: &DataSettings) -> Result<Vec<OhlcvBar>, GenetraderError> {
    let data = CsvAdapter::new(settings.path.clone());
    let bars = data.fetch_ohlcv(&settings.market)?;
    info!("loaded {} bars for {}", bars.len(), settings.market);
    Ok(bars)
}

fn run_evaluate(
    config_path: &Path,
    strategies_path: &Path,
    trace: bool,
) -> Result<(), GenetraderError> {
    let adapter = load_config(config_path)?;
    let data_settings = build_data_settings(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    let bars = load_market(&data_settings)?;

    let store = JsonStrategyAdapter::new(strategies_path.to_path_buf());
    let records = store.load()?;
    info!(
        "evaluating {} strategies from {}",
        records.len(),
        strategies_path.display()
    );

    let catalog = Catalog::builtin();
    for eval in evaluate_records(&catalog, &bars, &records, &bt_config, trace)? {
        println!(
            "strategy {}: fitness={:.4} buys={} sells={}",
            eval.index, eval.result.fitness, eval.result.buys, eval.result.sells
        );
        if let Some(values) = &eval.result.trace {
            let joined: Vec<String> = values.iter().map(|v| format!("{v:.4}")).collect();
            println!("  trace: {}", joined.join(","));
        }
    }
    Ok(())
}

fn run_sample(
    config_path: &Path,
    count: usize,
    keep: usize,
    output: Option<&Path>,
    mutate: bool,
    baseline_prob: Option<f64>,
) -> Result<(), GenetraderError> {
    let adapter = load_config(config_path)?;
    let data_settings = build_data_settings(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    let mut evolution = build_evolution_settings(&adapter)?;
    evolution.mutate |= mutate;
    let bars = load_market(&data_settings)?;

    let run_seed = evolution
        .seed
        .unwrap_or_else(|| entropy_rng().gen_range(0..u64::MAX));
    info!(
        "sampling {} chromosomes on {} workers (seed {})",
        count, evolution.workers, run_seed
    );

    let catalog = Catalog::builtin();
    let best = sample_strategies(
        &catalog,
        &bars,
        &bt_config,
        &evolution,
        run_seed,
        count,
        keep,
    )?;

    for (rank, (chromosome, fitness)) in best.iter().enumerate() {
        println!(
            "#{} fitness={:.4} windows={:?} devs={:?}",
            rank + 1,
            fitness,
            chromosome.genes().window_sizes,
            chromosome.genes().window_devs
        );
    }

    if let Some(prob) = baseline_prob {
        let fitness = baseline_fitness(&catalog, &bars, &bt_config, prob, run_seed, count)?;
        if !fitness.is_empty() {
            let top = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = fitness.iter().sum::<f64>() / fitness.len() as f64;
            println!(
                "baseline random-trigger p={}: runs={} best={:.4} mean={:.4}",
                prob,
                fitness.len(),
                top,
                mean
            );
        }
    }

    let records: Vec<StrategyRecord> = best
        .iter()
        .map(|(c, fitness)| c.to_record(Some(*fitness), Some(*fitness)))
        .collect();
    match output {
        Some(path) => {
            JsonStrategyAdapter::new(path.to_path_buf()).save(&records)?;
            info!("wrote {} strategies to {}", records.len(), path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&records)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn split_work_distributes_remainder() {
        assert_eq!(split_work(10, 3), vec![4, 3, 3]);
        assert_eq!(split_work(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(split_work(5, 0), vec![5]);
        assert_eq!(split_work(10, 3).iter().sum::<usize>(), 10);
    }

    #[test]
    fn backtest_config_uses_defaults() {
        let c = build_backtest_config(&config("[backtest]\n")).unwrap();
        assert_eq!(c, BacktestConfig::default());
    }

    #[test]
    fn backtest_config_reads_overrides() {
        let c = build_backtest_config(&config("[backtest]\ninitial_capital = 250\nfee = 0.001\n"))
            .unwrap();
        assert_eq!(c.initial_capital, 250.0);
        assert_eq!(c.fee, 0.001);
    }

    #[test]
    fn evolution_settings_parse() {
        let s = build_evolution_settings(&config(
            "[evolution]\nseed = 7\nmutation_prob = 0.3\nconstant_range = 2\nworkers = 3\n",
        ))
        .unwrap();
        assert_eq!(
            s,
            EvolutionSettings {
                seed: Some(7),
                mutation_prob: 0.3,
                constant_range: 2.0,
                workers: 3,
                mutate: false,
            }
        );
        assert_eq!(build_evolution_settings(&config("[evolution]\n")).unwrap().seed, None);
        assert!(build_evolution_settings(&config("[evolution]\nmutate = yes\n")).unwrap().mutate);
    }

    #[test]
    fn data_settings_trim_values() {
        let s = build_data_settings(&config("[data]\npath = ./data \nmarket = BTC-AUD\n")).unwrap();
        assert_eq!(s.path, PathBuf::from("./data"));
        assert_eq!(s.market, "BTC-AUD");
    }

    #[test]
    fn invalid_sections_are_rejected() {
        assert!(build_data_settings(&config("[data]\nmarket = X\n")).is_err());
        assert!(build_backtest_config(&config("[backtest]\nfee = 2\n")).is_err());
        assert!(build_evolution_settings(&config("[evolution]\nworkers = 0\n")).is_err());
    }
}
