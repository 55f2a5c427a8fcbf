//! Scan coordinator — drives the screening engine across a universe.
//!
//! The sequential scan is the reference behavior: matches are aggregated in
//! instrument order, then stably re-sorted by lot volume for presentation.
//! Parallel scans write into per-index slots so the aggregation pass sees the
//! exact same order as the sequential scan; only the completed-count progress
//! differs in timing, never in monotonicity.

use crate::progress::ScanProgress;
use screenlab_core::data::{BarFetcher, DataError, InstrumentLister};
use screenlab_core::domain::{BarSeries, Instrument};
use screenlab_core::engine::{evaluate, EngineConfig, MatchRecord, NoMatchReason, ScreenOutcome};
use screenlab_core::strategy::StrategyDefinition;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Coordinator knobs. `workers <= 1` selects the sequential reference scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub workers: usize,
    /// Report progress after every N completed instruments.
    pub progress_interval: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            progress_interval: 5,
        }
    }
}

/// Cooperative cancellation flag, checked between instruments only.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Only the inability to obtain the instrument universe aborts a scan;
/// everything below that boundary becomes a counted skip.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("instrument lister failed: {0}")]
    Lister(#[from] DataError),
}

/// Aggregated outcome of one scan. Zero matches is a valid result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    /// Matches sorted by lot volume descending; ties keep first-seen order.
    pub matches: Vec<MatchRecord>,
    pub attempted: usize,
    pub matched: usize,
    pub no_match: usize,
    pub insufficient_history: usize,
    pub fetch_errors: usize,
    pub compute_errors: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// What happened to one instrument.
enum InstrumentOutcome {
    Screened(ScreenOutcome),
    FetchFailed(DataError),
}

/// Fetch bars and run the engine for one instrument. Never fails the scan.
fn process_one(
    fetcher: &dyn BarFetcher,
    strategy: &StrategyDefinition,
    engine_config: &EngineConfig,
    instrument: &Instrument,
) -> InstrumentOutcome {
    let bars = match fetcher.fetch_daily(instrument) {
        Ok(bars) => bars,
        Err(e) => return InstrumentOutcome::FetchFailed(e),
    };
    match BarSeries::new(instrument.clone(), bars) {
        Ok(series) => InstrumentOutcome::Screened(evaluate(&series, strategy, engine_config)),
        Err(e) => InstrumentOutcome::Screened(ScreenOutcome::NoMatch(NoMatchReason::ComputeError(
            e.to_string(),
        ))),
    }
}

/// Gate that keeps parallel progress reports monotonic.
struct ProgressGate {
    completed: AtomicUsize,
    last_reported: Mutex<usize>,
    interval: usize,
    total: usize,
}

impl ProgressGate {
    fn new(interval: usize, total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            last_reported: Mutex::new(0),
            interval: interval.max(1),
            total,
        }
    }

    fn complete(&self, instrument_id: &str, progress: &dyn ScanProgress) {
        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        if done % self.interval != 0 && done != self.total {
            return;
        }
        let mut last = match self.last_reported.lock() {
            Ok(guard) => guard,
            Err(_) => return,
        };
        if done > *last {
            *last = done;
            progress.on_instrument(done, self.total, instrument_id);
        }
    }
}

/// Scan a universe against one strategy.
///
/// Fetch or evaluation problems skip the instrument and are counted; only a
/// lister failure (including an empty universe) aborts. Cancellation between
/// instruments returns the partial result with `cancelled` set.
pub fn scan(
    lister: &dyn InstrumentLister,
    fetcher: &dyn BarFetcher,
    strategy: &StrategyDefinition,
    engine_config: &EngineConfig,
    scan_config: &ScanConfig,
    progress: &dyn ScanProgress,
    cancel: &CancelToken,
) -> Result<ScanResult, ScanError> {
    let start = Instant::now();

    let instruments = lister.list()?;
    if instruments.is_empty() {
        return Err(ScanError::Lister(DataError::Universe(
            "instrument lister returned an empty universe".to_string(),
        )));
    }

    let total = instruments.len();
    let gate = ProgressGate::new(scan_config.progress_interval, total);

    let slots: Vec<Option<InstrumentOutcome>> = if scan_config.workers > 1 {
        parallel_scan(
            &instruments,
            fetcher,
            strategy,
            engine_config,
            scan_config.workers,
            &gate,
            progress,
            cancel,
        )
    } else {
        sequential_scan(
            &instruments,
            fetcher,
            strategy,
            engine_config,
            &gate,
            progress,
            cancel,
        )
    };

    let mut result = ScanResult::default();
    for slot in slots {
        match slot {
            None => result.cancelled = true,
            Some(InstrumentOutcome::FetchFailed(_)) => {
                result.attempted += 1;
                result.fetch_errors += 1;
            }
            Some(InstrumentOutcome::Screened(ScreenOutcome::Match(record))) => {
                result.attempted += 1;
                result.matched += 1;
                result.matches.push(record);
            }
            Some(InstrumentOutcome::Screened(ScreenOutcome::NoMatch(reason))) => {
                result.attempted += 1;
                match reason {
                    NoMatchReason::InsufficientHistory { .. } => result.insufficient_history += 1,
                    NoMatchReason::ComputeError(_) => result.compute_errors += 1,
                    NoMatchReason::PredicateFailed { .. } => result.no_match += 1,
                }
            }
        }
    }

    // Presentation ordering only: stable sort keeps first-seen order on ties.
    result.matches.sort_by(|a, b| b.volume_lots.cmp(&a.volume_lots));
    result.elapsed = start.elapsed();
    progress.on_finish(result.elapsed, result.matched);
    Ok(result)
}

fn sequential_scan(
    instruments: &[Instrument],
    fetcher: &dyn BarFetcher,
    strategy: &StrategyDefinition,
    engine_config: &EngineConfig,
    gate: &ProgressGate,
    progress: &dyn ScanProgress,
    cancel: &CancelToken,
) -> Vec<Option<InstrumentOutcome>> {
    let mut slots = Vec::with_capacity(instruments.len());
    for instrument in instruments {
        if cancel.is_cancelled() {
            slots.push(None);
            continue;
        }
        let outcome = process_one(fetcher, strategy, engine_config, instrument);
        gate.complete(&instrument.id, progress);
        slots.push(Some(outcome));
    }
    slots
}

#[allow(clippy::too_many_arguments)]
fn parallel_scan(
    instruments: &[Instrument],
    fetcher: &dyn BarFetcher,
    strategy: &StrategyDefinition,
    engine_config: &EngineConfig,
    workers: usize,
    gate: &ProgressGate,
    progress: &dyn ScanProgress,
    cancel: &CancelToken,
) -> Vec<Option<InstrumentOutcome>> {
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool,
        // Degrade to the sequential reference scan rather than failing.
        Err(_) => {
            return sequential_scan(
                instruments,
                fetcher,
                strategy,
                engine_config,
                gate,
                progress,
                cancel,
            )
        }
    };

    pool.install(|| {
        instruments
            .par_iter()
            .map(|instrument| {
                if cancel.is_cancelled() {
                    return None;
                }
                let outcome = process_one(fetcher, strategy, engine_config, instrument);
                gate.complete(&instrument.id, progress);
                Some(outcome)
            })
            .collect()
    })
}
