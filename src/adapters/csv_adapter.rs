//! CSV file data adapter.
//!
//! One file per market: `<base_path>/<market>.csv` with header
//! `date,open,high,low,close,volume` and `%Y-%m-%d` dates.

use crate::domain::error::GenetraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, market: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", market))
    }
}

fn parse_price(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<f64, GenetraderError> {
    record
        .get(index)
        .ok_or_else(|| GenetraderError::Data {
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e| GenetraderError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(&self, market: &str) -> Result<Vec<OhlcvBar>, GenetraderError> {
        let path = self.csv_path(market);
        let content = fs::read_to_string(&path).map_err(|e| GenetraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| GenetraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(0).ok_or_else(|| GenetraderError::Data {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                GenetraderError::Data {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            let close = parse_price(&record, 4, "close")?;
            if !close.is_finite() || close <= 0.0 {
                return Err(GenetraderError::Data {
                    reason: format!("non-positive close {} on {}", close, date),
                });
            }

            bars.push(OhlcvBar {
                date,
                open: parse_price(&record, 1, "open")?,
                high: parse_price(&record, 2, "high")?,
                low: parse_price(&record, 3, "low")?,
                close,
                volume: parse_price(&record, 5, "volume")?,
            });
        }

        if bars.is_empty() {
            return Err(GenetraderError::NoData {
                market: market.to_string(),
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_markets(&self) -> Result<Vec<String>, GenetraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| GenetraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut markets = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| GenetraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(market) = name_str.strip_suffix(".csv") {
                markets.push(market.to_string());
            }
        }

        markets.sort();
        Ok(markets)
    }
}
