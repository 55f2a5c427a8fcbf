//! ScreenLab Runner — scan orchestration on top of `screenlab-core`.
//!
//! This crate provides:
//! - The scan coordinator: sequential or bounded-parallel fetch+evaluate
//!   over an instrument universe, with cooperative cancellation
//! - Progress reporting traits (periodic tuples plus a terminal summary)
//! - Result aggregation with the lot-volume presentation ordering
//! - Export: text table, CSV, JSON
//! - TOML scan settings

pub mod config;
pub mod coordinator;
pub mod progress;
pub mod report;

pub use config::{ConfigError, ScanSettings};
pub use coordinator::{scan, CancelToken, ScanConfig, ScanError, ScanResult};
pub use progress::{ScanProgress, SilentProgress, StdoutProgress};
pub use report::{export_csv, export_json, render_table};
