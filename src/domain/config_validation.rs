//! Configuration validation.
//!
//! Validates all config fields before any data is loaded.

use crate::domain::error::GenetraderError;
use crate::ports::config_port::ConfigPort;
use std::str::FromStr;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), GenetraderError> {
    require_non_empty(config, "data", "path")?;
    require_non_empty(config, "data", "market")?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), GenetraderError> {
    validate_initial_capital(config)?;
    validate_fee(config)?;
    Ok(())
}

pub fn validate_evolution_config(config: &dyn ConfigPort) -> Result<(), GenetraderError> {
    validate_seed(config)?;
    validate_mutation_prob(config)?;
    validate_constant_range(config)?;
    validate_workers(config)?;
    validate_mutate(config)?;
    Ok(())
}

fn require_non_empty(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), GenetraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(GenetraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

/// Parse `key` when present. A value that is set but unparsable is an error,
/// never a silent fall back to the default.
fn parse_present<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, GenetraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            GenetraderError::config_invalid(
                section,
                key,
                format!("expected {expected}, got {:?}", raw.trim()),
            )
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), GenetraderError> {
    let value = parse_present::<f64>(config, "backtest", "initial_capital", "a number")?
        .unwrap_or(100.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(GenetraderError::config_invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_fee(config: &dyn ConfigPort) -> Result<(), GenetraderError> {
    let value = parse_present::<f64>(config, "backtest", "fee", "a number")?.unwrap_or(0.02);
    if !(0.0..1.0).contains(&value) {
        return Err(GenetraderError::config_invalid(
            "backtest",
            "fee",
            "fee must be in [0, 1)",
        ));
    }
    Ok(())
}

fn validate_seed(config: &dyn ConfigPort) -> Result<(), GenetraderError> {
    parse_present::<u64>(config, "evolution", "seed", "a non-negative integer")?;
    Ok(())
}

fn validate_mutation_prob(config: &dyn ConfigPort) -> Result<(), GenetraderError> {
    let value = parse_present::<f64>(config, "evolution", "mutation_prob", "a number")?
        .unwrap_or(0.5);
    if !(0.0..=1.0).contains(&value) {
        return Err(GenetraderError::config_invalid(
            "evolution",
            "mutation_prob",
            "mutation_prob must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_constant_range(config: &dyn ConfigPort) -> Result<(), GenetraderError> {
    let value = parse_present::<f64>(config, "evolution", "constant_range", "a number")?
        .unwrap_or(1.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(GenetraderError::config_invalid(
            "evolution",
            "constant_range",
            "constant_range must be positive",
        ));
    }
    Ok(())
}

fn validate_workers(config: &dyn ConfigPort) -> Result<(), GenetraderError> {
    let value = parse_present::<i64>(config, "evolution", "workers", "an integer")?.unwrap_or(1);
    if value < 1 {
        return Err(GenetraderError::config_invalid(
            "evolution",
            "workers",
            "workers must be at least 1",
        ));
    }
    Ok(())
}

fn validate_mutate(config: &dyn ConfigPort) -> Result<(), GenetraderError> {
    if let Some(raw) = config.get_string("evolution", "mutate") {
        let known = ["true", "false", "yes", "no", "1", "0"];
        if !known.contains(&raw.trim().to_lowercase().as_str()) {
            return Err(GenetraderError::config_invalid(
                "evolution",
                "mutate",
                format!("expected a boolean, got {:?}", raw.trim()),
            ));
        }
    }
    Ok(())
}
