//! CSV directory bar fetcher.
//!
//! Reads `{id}.csv` from a directory, one file per instrument, columns
//! `date,open,high,low,close,volume`. Header names are matched
//! case-insensitively and rows may arrive out of order; the fetcher sorts by
//! date before handing bars to the series constructor. Volume is parsed as a
//! decimal and floored to a share count.

use super::provider::{BarFetcher, DataError};
use crate::domain::{Bar, Instrument};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Offline fetcher over a directory of per-instrument CSV files.
pub struct CsvBarFetcher {
    dir: PathBuf,
}

impl CsvBarFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    fn parse_field(record: &csv::StringRecord, index: usize, row: usize, name: &str, id: &str) -> Result<f64, DataError> {
        let raw = record.get(index).unwrap_or("").trim();
        raw.parse::<f64>().map_err(|_| DataError::Unavailable {
            id: id.to_string(),
            detail: format!("row {row}: bad {name} value '{raw}'"),
        })
    }
}

impl BarFetcher for CsvBarFetcher {
    fn name(&self) -> &str {
        "csv-directory"
    }

    fn fetch_daily(&self, instrument: &Instrument) -> Result<Vec<Bar>, DataError> {
        let id = &instrument.id;
        let path = self.dir.join(format!("{id}.csv"));
        let mut reader = csv::Reader::from_path(&path).map_err(|e| DataError::Unavailable {
            id: id.clone(),
            detail: format!("open {}: {e}", path.display()),
        })?;

        let headers = reader
            .headers()
            .map_err(|e| DataError::Unavailable {
                id: id.clone(),
                detail: format!("read headers: {e}"),
            })?
            .clone();

        let column = |name: &str| {
            Self::column_index(&headers, name).ok_or_else(|| DataError::ResponseFormatChanged(
                format!("{}: missing column '{name}'", path.display()),
            ))
        };
        let date_col = column("date")?;
        let open_col = column("open")?;
        let high_col = column("high")?;
        let low_col = column("low")?;
        let close_col = column("close")?;
        let volume_col = column("volume")?;

        let mut bars = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| DataError::Unavailable {
                id: id.clone(),
                detail: format!("row {row}: {e}"),
            })?;

            let raw_date = record.get(date_col).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
                DataError::Unavailable {
                    id: id.clone(),
                    detail: format!("row {row}: bad date '{raw_date}'"),
                }
            })?;

            let volume = Self::parse_field(&record, volume_col, row, "volume", id)?;
            bars.push(Bar {
                date,
                open: Self::parse_field(&record, open_col, row, "open", id)?,
                high: Self::parse_field(&record, high_col, row, "high", id)?,
                low: Self::parse_field(&record, low_col, row, "low", id)?,
                close: Self::parse_field(&record, close_col, row, "close", id)?,
                volume: volume.max(0.0) as u64,
            });
        }

        if bars.is_empty() {
            return Err(DataError::Unavailable {
                id: id.clone(),
                detail: "no rows".to_string(),
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}
