//! Progress reporting for long scans.
//!
//! Reporting is purely observational: implementations must not block the
//! scan or influence its semantics.

use std::time::Duration;

/// Status sink for scan progress.
pub trait ScanProgress: Send + Sync {
    /// Called after every `progress_interval`-th completed instrument.
    /// `completed` counts are monotonic even under parallel scans.
    fn on_instrument(&self, completed: usize, total: usize, instrument_id: &str);

    /// Called once when the scan finishes (or is cancelled).
    fn on_finish(&self, elapsed: Duration, matches: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl ScanProgress for StdoutProgress {
    fn on_instrument(&self, completed: usize, total: usize, instrument_id: &str) {
        println!("[{completed}/{total}] screening {instrument_id}...");
    }

    fn on_finish(&self, elapsed: Duration, matches: usize) {
        let secs = elapsed.as_secs();
        println!(
            "\nScan complete in {}m {}s: {matches} match(es)",
            secs / 60,
            secs % 60
        );
    }
}

/// No-op reporter for tests and benchmarks.
pub struct SilentProgress;

impl ScanProgress for SilentProgress {
    fn on_instrument(&self, _completed: usize, _total: usize, _instrument_id: &str) {}
    fn on_finish(&self, _elapsed: Duration, _matches: usize) {}
}
