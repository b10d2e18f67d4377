//! JSON file store for evolved strategies.
//!
//! The file holds a JSON array of [`StrategyRecord`]s.

use crate::domain::error::GenetraderError;
use crate::domain::record::StrategyRecord;
use crate::ports::strategy_store::StrategyStore;
use std::fs;
use std::path::PathBuf;

pub struct JsonStrategyAdapter {
    path: PathBuf,
}

impl JsonStrategyAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StrategyStore for JsonStrategyAdapter {
    fn load(&self) -> Result<Vec<StrategyRecord>, GenetraderError> {
        let content = fs::read_to_string(&self.path)?;
        let records = serde_json::from_str(&content)?;
        Ok(records)
    }

    fn save(&self, records: &[StrategyRecord]) -> Result<(), GenetraderError> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_records() -> Vec<StrategyRecord> {
        vec![
            StrategyRecord {
                window_sizes: vec![10, 20, 30, 40],
                window_devs: vec![2.0, 2.5],
                constants: vec![0.1, -0.2, 0.3, -0.4, 0.5, -0.6, 0.7, -0.8],
                fitness: Some(120.5),
                portfolio: Some(120.5),
            },
            StrategyRecord {
                window_sizes: vec![1, 2, 3, 4],
                window_devs: vec![1.0, 1.1],
                constants: vec![0.0; 8],
                fitness: None,
                portfolio: Some(100.0),
            },
        ]
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonStrategyAdapter::new(dir.path().join("strategies.json"));
        store.save(&sample_records()).unwrap();
        assert_eq!(store.load().unwrap(), sample_records());
    }

    #[test]
    fn loads_hand_written_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("best.json");
        fs::write(
            &path,
            concat!(
                r#"[{"window_sizes":[5,8,20,20],"window_devs":[2,2],"#,
                r#""constants":[1,0,0,0,0,0,0,0],"fitness":null,"portfolio":null}]"#
            ),
        )
        .unwrap();
        let records = JsonStrategyAdapter::new(path).load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].window_devs, vec![2.0, 2.0]);
        assert_eq!(records[0].constants[0], 1.0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonStrategyAdapter::new(dir.path().join("absent.json"));
        assert!(matches!(store.load(), Err(GenetraderError::Io(_))));
    }

    #[test]
    fn malformed_file_is_json_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonStrategyAdapter::new(path).load(),
            Err(GenetraderError::Json(_))
        ));
    }
}
