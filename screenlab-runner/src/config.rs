//! Serializable scan settings.
//!
//! A TOML file can pin the strategy, volume floor, and coordinator knobs for
//! repeatable scans:
//!
//! ```toml
//! strategy = "basing-retest"
//! min_volume_lots = 500
//! workers = 4
//! progress_interval = 5
//! ```

use crate::coordinator::ScanConfig;
use screenlab_core::engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Io(String),
    #[error("parse config TOML: {0}")]
    Parse(String),
}

/// One scan's settings: which strategy, which floor, how to run it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default)]
    pub min_volume_lots: Option<f64>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

fn default_strategy() -> String {
    "basing-retest".to_string()
}

fn default_workers() -> usize {
    1
}

fn default_progress_interval() -> usize {
    5
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            min_volume_lots: None,
            workers: default_workers(),
            progress_interval: default_progress_interval(),
        }
    }
}

impl ScanSettings {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            min_volume_lots: self.min_volume_lots,
        }
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            workers: self.workers,
            progress_interval: self.progress_interval,
        }
    }
}
