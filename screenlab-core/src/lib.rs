//! ScreenLab Core — technical setup screening over daily bars.
//!
//! This crate contains the heart of the screener:
//! - Domain types (bars, bar series, instruments, market tiers)
//! - Rolling indicator store with NaN-until-filled warmup semantics
//! - Composable predicate library (alignment, monotonic runs, retests,
//!   bias/convergence ratios, volume floors)
//! - Data-driven strategy catalog (five canonical setups)
//! - The screening engine: one bar series + one strategy in, match or a
//!   typed no-match reason out
//! - Data-provider traits and the two thin provider implementations
//!   (Yahoo chart API, CSV directory)

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod predicates;
pub mod strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything that crosses the scan worker boundary
    /// is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::BarSeries>();
        require_sync::<domain::BarSeries>();
        require_send::<domain::Instrument>();
        require_sync::<domain::Instrument>();
        require_send::<domain::MarketTier>();
        require_sync::<domain::MarketTier>();

        require_send::<strategy::StrategyDefinition>();
        require_sync::<strategy::StrategyDefinition>();
        require_send::<engine::EngineConfig>();
        require_sync::<engine::EngineConfig>();
        require_send::<engine::MatchRecord>();
        require_sync::<engine::MatchRecord>();
        require_send::<engine::ScreenOutcome>();
        require_sync::<engine::ScreenOutcome>();

        require_send::<data::DataError>();
        require_sync::<data::DataError>();
    }
}
