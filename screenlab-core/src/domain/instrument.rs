//! Instrument identity and market tier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Listing venue tier for an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketTier {
    /// Main board listing.
    Primary,
    /// Over-the-counter / secondary board listing.
    Secondary,
}

impl fmt::Display for MarketTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketTier::Primary => write!(f, "primary"),
            MarketTier::Secondary => write!(f, "secondary"),
        }
    }
}

/// An eligible instrument: exchange code, display name, and board tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: String,
    pub name: String,
    pub market: MarketTier,
}

impl Instrument {
    pub fn new(id: impl Into<String>, name: impl Into<String>, market: MarketTier) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            market,
        }
    }
}
