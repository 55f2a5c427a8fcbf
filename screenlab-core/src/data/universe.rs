//! Universe configuration — tier-organized instrument lists.
//!
//! The universe is a TOML file mapping instrument ids to display names for
//! each board tier:
//!
//! ```toml
//! [primary]
//! "2330" = "TSMC"
//! "2317" = "Hon Hai"
//!
//! [secondary]
//! "5483" = "Sino-American Silicon"
//! ```

use super::provider::{DataError, InstrumentLister};
use crate::domain::{Instrument, MarketTier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The complete universe configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Universe {
    #[serde(default)]
    pub primary: BTreeMap<String, String>,
    #[serde(default)]
    pub secondary: BTreeMap<String, String>,
}

impl Universe {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DataError::Universe(format!("read universe file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, DataError> {
        toml::from_str(content).map_err(|e| DataError::Universe(format!("parse universe TOML: {e}")))
    }

    /// All instruments, primary board first, deterministic order within a tier.
    pub fn instruments(&self) -> Vec<Instrument> {
        let primary = self
            .primary
            .iter()
            .map(|(id, name)| Instrument::new(id.clone(), name.clone(), MarketTier::Primary));
        let secondary = self
            .secondary
            .iter()
            .map(|(id, name)| Instrument::new(id.clone(), name.clone(), MarketTier::Secondary));
        primary.chain(secondary).collect()
    }

    /// Total number of instruments.
    pub fn len(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }

    /// Built-in sample universe of liquid Taiwan-market names, for quick
    /// scans before a full universe file is configured.
    pub fn default_tw() -> Self {
        let mut primary = BTreeMap::new();
        for (id, name) in [
            ("1301", "Formosa Plastics"),
            ("2002", "China Steel"),
            ("2303", "UMC"),
            ("2308", "Delta Electronics"),
            ("2317", "Hon Hai"),
            ("2330", "TSMC"),
            ("2382", "Quanta"),
            ("2454", "MediaTek"),
            ("2603", "Evergreen Marine"),
            ("2881", "Fubon Financial"),
            ("2882", "Cathay Financial"),
            ("3008", "Largan"),
        ] {
            primary.insert(id.to_string(), name.to_string());
        }

        let mut secondary = BTreeMap::new();
        for (id, name) in [
            ("3105", "WIN Semiconductors"),
            ("5274", "ASPEED"),
            ("5483", "Sino-American Silicon"),
            ("6488", "GlobalWafers"),
        ] {
            secondary.insert(id.to_string(), name.to_string());
        }

        Self { primary, secondary }
    }
}

impl InstrumentLister for Universe {
    fn name(&self) -> &str {
        "universe"
    }

    fn list(&self) -> Result<Vec<Instrument>, DataError> {
        if self.is_empty() {
            return Err(DataError::Universe(
                "universe is empty; refusing to scan nothing".to_string(),
            ));
        }
        Ok(self.instruments())
    }
}
