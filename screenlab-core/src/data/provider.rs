//! Data provider traits and structured error types.
//!
//! The traits abstract over data sources (Yahoo chart API, CSV directories,
//! mocks in tests) so the scan coordinator never knows where bars come from.
//! Providers do no screening of their own; they only deliver bars and
//! instrument lists.

use crate::domain::{Bar, Instrument};
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("instrument not found: {id}")]
    InstrumentNotFound { id: String },

    #[error("bars unavailable for '{id}': {detail}")]
    Unavailable { id: String, detail: String },

    #[error("universe error: {0}")]
    Universe(String),
}

/// Supplies the set of eligible instruments for one scan.
///
/// Invoked once per scan. An empty universe is an error — the scan must fail
/// loudly rather than silently screen nothing.
pub trait InstrumentLister: Send + Sync {
    /// Human-readable name of this lister.
    fn name(&self) -> &str;

    /// All eligible instruments, partitioned by market tier inside
    /// [`Instrument::market`].
    fn list(&self) -> Result<Vec<Instrument>, DataError>;
}

/// Fetches daily bars for one instrument.
///
/// Implementations must cover at least the longest lookback any strategy
/// needs (about 18 months of trading days) and always deliver volume from
/// the provider's decimal column, never a pre-truncated integer.
pub trait BarFetcher: Send + Sync {
    /// Human-readable name of this fetcher.
    fn name(&self) -> &str;

    /// Ordered daily bars, oldest first.
    fn fetch_daily(&self, instrument: &Instrument) -> Result<Vec<Bar>, DataError>;
}
