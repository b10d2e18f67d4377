//! End-to-end fitness evaluation through the builtin catalog.

mod common;

use approx::assert_relative_eq;
use common::*;
use genetrader::domain::backtest::{run_backtest, BacktestConfig, Side};
use genetrader::domain::catalog::Catalog;
use genetrader::domain::chromosome::Chromosome;
use genetrader::domain::decision::{Decision, DecisionRule};
use genetrader::domain::error::GenetraderError;
use genetrader::domain::record::StrategyRecord;
use genetrader::domain::rng::seeded_rng;
use genetrader::ports::data_port::DataPort;

fn single_crossing() -> Chromosome {
    // buy score = SMA(1) - lower band(2, 1.0): 0 at t=1, 10 at t=2, 0 at t=3
    crossing_chromosome(
        builtin_slots(1, 1, (2, 1.0), (2, 1.0)),
        vec![1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    )
}

#[test]
fn buy_once_then_forced_liquidation() {
    let bars = bars_from_closes(&[10.0, 10.0, 20.0, 10.0]);
    let result = run_backtest(
        &single_crossing(),
        &Catalog::builtin(),
        &bars,
        &BacktestConfig::default(),
        false,
    )
    .unwrap();

    assert_relative_eq!(result.fitness, 48.02, epsilon = 1e-9);
    assert_eq!(result.buys, 1);
    assert_eq!(result.sells, 1);

    let buy = &result.events[0];
    assert_eq!(buy.side, Side::Buy);
    assert_eq!(buy.index, 2);
    assert_relative_eq!(buy.base, 4.9, epsilon = 1e-12);

    let sell = &result.events[1];
    assert_eq!(sell.side, Side::Sell);
    assert_eq!(sell.index, 3);
    assert!(sell.forced);
    assert_relative_eq!(result.fitness, buy.base * 0.98 * 10.0, epsilon = 1e-12);
}

#[test]
fn flat_series_keeps_initial_capital() {
    let catalog = Catalog::builtin();
    let bars = bars_from_closes(&[50.0; 40]);
    let weight_sets = [
        vec![1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        vec![0.5, 0.3, 0.2, -0.1, -0.4, 0.2, 0.1, 0.3],
        vec![-0.7, -0.2, 0.1, -0.3, 0.9, 0.4, -0.2, 0.6],
    ];
    for constants in weight_sets {
        let chromosome = crossing_chromosome(builtin_slots(3, 5, (10, 2.0), (20, 1.5)), constants);
        let result =
            run_backtest(&chromosome, &catalog, &bars, &BacktestConfig::default(), false).unwrap();
        assert_eq!(result.fitness, 100.0);
        assert_eq!(result.buys, 0);
        assert_eq!(result.sells, 0);
        assert!(result.events.is_empty());
    }
}

#[test]
fn flat_series_with_cancelling_weights_never_trades() {
    let catalog = Catalog::builtin();
    // SMA - EMA on buy, EMA - SMA on sell: zero on any flat series
    let constants = vec![1.0, -1.0, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0];
    for price in [0.1, 0.3, 1.1, 3.7, 9.99, 42.42, 123.45] {
        let bars = bars_from_closes(&vec![price; 200]);
        for window in 2..30 {
            let chromosome = crossing_chromosome(
                builtin_slots(window, window, (2, 1.0), (2, 1.0)),
                constants.clone(),
            );
            let result =
                run_backtest(&chromosome, &catalog, &bars, &BacktestConfig::default(), false)
                    .unwrap();
            assert_eq!(result.fitness, 100.0, "price {price} window {window}");
            assert!(result.events.is_empty(), "price {price} window {window}");
        }
    }
}

#[test]
fn data_port_feeds_the_engine() {
    let port =
        MockDataPort::new().with_bars("TEST-AUD", bars_from_closes(&[10.0, 10.0, 20.0, 10.0]));
    let bars = port.fetch_ohlcv("TEST-AUD").unwrap();
    let result = run_backtest(
        &single_crossing(),
        &Catalog::builtin(),
        &bars,
        &BacktestConfig::default(),
        true,
    )
    .unwrap();
    assert_relative_eq!(result.fitness, 48.02, epsilon = 1e-9);
    assert_eq!(result.trace.unwrap().len(), 5);
    assert!(matches!(
        port.fetch_ohlcv("NONE"),
        Err(GenetraderError::NoData { .. })
    ));
}

#[test]
fn record_round_trip_reproduces_fitness() {
    let catalog = Catalog::builtin();
    let bars = bars_from_closes(&wavy_closes(300));
    let config = BacktestConfig::default();
    let mut rng = seeded_rng(2024);

    for _ in 0..10 {
        let original = Chromosome::random(
            &catalog,
            DecisionRule::WeightedCrossing,
            2 * catalog.size(),
            1.0,
            &mut rng,
        )
        .unwrap();
        let fitness = run_backtest(&original, &catalog, &bars, &config, false)
            .unwrap()
            .fitness;

        let record = original.to_record(Some(fitness), Some(fitness));
        let json = serde_json::to_string(&record).unwrap();
        let record: StrategyRecord = serde_json::from_str(&json).unwrap();
        assert_relative_eq!(record.fitness.unwrap(), fitness, max_relative = 1e-12);

        let rebuilt =
            Chromosome::from_record(&catalog, &record, DecisionRule::WeightedCrossing).unwrap();
        assert_eq!(rebuilt, original);
        let again = run_backtest(&rebuilt, &catalog, &bars, &config, false).unwrap();
        assert_eq!(again.fitness, fitness);
    }
}

#[test]
fn bound_rule_drives_the_engine() {
    let catalog = Catalog::builtin();
    let rule = DecisionRule::bound("alternate", |_, t| {
        if t % 2 == 1 { Decision::Buy } else { Decision::Sell }
    });
    let chromosome = Chromosome::new(
        &catalog,
        builtin_slots(1, 1, (1, 1.0), (1, 1.0)),
        Vec::new(),
        rule,
    )
    .unwrap();
    let bars = bars_from_closes(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0]);
    let result =
        run_backtest(&chromosome, &catalog, &bars, &BacktestConfig::default(), false).unwrap();

    // buy at 1, 3, 5; sell at 2, 4; forced sell at 5
    assert_eq!(result.buys, 3);
    assert_eq!(result.sells, 3);
    assert_relative_eq!(result.fitness, 100.0 * 0.98f64.powi(6), epsilon = 1e-9);
}

#[test]
fn random_trigger_alternates_and_replays_per_seed() {
    let catalog = Catalog::builtin();
    let bars = bars_from_closes(&wavy_closes(400));
    let run = |seed: u64| {
        let rule = DecisionRule::random_trigger(0.05, seeded_rng(seed)).unwrap();
        let chromosome =
            Chromosome::new(&catalog, builtin_slots(1, 1, (1, 1.0), (1, 1.0)), Vec::new(), rule)
                .unwrap();
        run_backtest(&chromosome, &catalog, &bars, &BacktestConfig::default(), false).unwrap()
    };

    let result = run(3);
    assert!(result.buys > 0);
    assert_eq!(result.buys, result.sells);
    for (i, event) in result.events.iter().enumerate() {
        let expected = if i % 2 == 0 { Side::Buy } else { Side::Sell };
        assert_eq!(event.side, expected);
    }
    assert_eq!(run(3), result);
}

#[test]
fn custom_config_changes_accounting() {
    let bars = bars_from_closes(&[10.0, 10.0, 20.0, 10.0]);
    let config = BacktestConfig {
        initial_capital: 1000.0,
        fee: 0.0,
    };
    let result =
        run_backtest(&single_crossing(), &Catalog::builtin(), &bars, &config, false).unwrap();
    assert_relative_eq!(result.fitness, 500.0, epsilon = 1e-9);
}

#[test]
fn mismatched_slots_fail_before_simulation() {
    let catalog = Catalog::builtin();
    let chromosome = single_crossing();
    let two_slot = Catalog::new(vec![
        catalog.descriptor(0).unwrap().clone(),
        catalog.descriptor(1).unwrap().clone(),
    ])
    .unwrap();
    let bars = bars_from_closes(&[10.0, 11.0, 12.0]);
    assert!(matches!(
        run_backtest(&chromosome, &two_slot, &bars, &BacktestConfig::default(), false),
        Err(GenetraderError::SlotCountMismatch { expected: 2, actual: 4 })
    ));
}
