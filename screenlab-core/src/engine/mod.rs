//! ScreeningEngine — evaluate one bar series against one strategy.
//!
//! Evaluation is a pure function of (series, strategy, config): no state
//! survives between calls, and nothing below this boundary is fatal — a
//! degenerate series becomes a typed no-match outcome, never a panic that
//! could abort a batch scan.

use crate::domain::{BarSeries, MarketTier};
use crate::indicators::store::SHARES_PER_LOT;
use crate::indicators::IndicatorStore;
use crate::predicates::{self, EvalContext};
use crate::strategy::{Diagnostic, StrategyDefinition};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Engine-level configuration shared across strategies.
///
/// The minimum-volume floor is explicit and passed into every evaluation,
/// never ambient state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Overrides each strategy's default volume floor (in board lots).
    pub min_volume_lots: Option<f64>,
}

/// Why an instrument did not match. None of these abort a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum NoMatchReason {
    /// Fewer bars than the strategy requires.
    InsufficientHistory { required: usize, actual: usize },
    /// Short-circuit at the first failing predicate.
    PredicateFailed { index: usize, name: &'static str },
    /// Unexpected numeric/data anomaly; the instrument is skipped, not retried.
    ComputeError(String),
}

/// A full predicate pass, with the diagnostic fields downstream sinks render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub as_of: NaiveDate,
    pub instrument_id: String,
    pub name: String,
    pub market: MarketTier,
    /// Last close, rounded to 2 decimal places.
    pub close: f64,
    /// Last volume in whole board lots, floored from the decimal lot count.
    pub volume_lots: u64,
    pub strategy: String,
    pub note: String,
    /// 5/200 bias percentage where the strategy computes one; `None` is the
    /// "not applicable" sentinel.
    pub bias_pct: Option<f64>,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenOutcome {
    Match(MatchRecord),
    NoMatch(NoMatchReason),
}

impl ScreenOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, ScreenOutcome::Match(_))
    }
}

/// Round to 2 decimal places for reporting.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Evaluate one instrument's history against one strategy.
pub fn evaluate(
    series: &BarSeries,
    strategy: &StrategyDefinition,
    config: &EngineConfig,
) -> ScreenOutcome {
    let actual = series.len();
    if actual < strategy.min_history {
        return ScreenOutcome::NoMatch(NoMatchReason::InsufficientHistory {
            required: strategy.min_history,
            actual,
        });
    }

    // Snapshot the as-of state once; every predicate sees the same values.
    let last = match series.last() {
        Some(bar) => bar,
        None => {
            return ScreenOutcome::NoMatch(NoMatchReason::ComputeError(
                "empty series".to_string(),
            ))
        }
    };
    if !last.close.is_finite() || last.close <= 0.0 {
        return ScreenOutcome::NoMatch(NoMatchReason::ComputeError(format!(
            "degenerate last close {}",
            last.close
        )));
    }
    let last_volume_lots = last.volume as f64 / SHARES_PER_LOT;

    let store = IndicatorStore::new(series);
    let ctx = EvalContext {
        store: &store,
        last_close: last.close,
        last_volume_lots,
        config,
    };

    for (index, predicate) in strategy.predicates.iter().enumerate() {
        if !predicate.evaluate(&ctx) {
            return ScreenOutcome::NoMatch(NoMatchReason::PredicateFailed {
                index,
                name: predicate.name(),
            });
        }
    }

    let bias = match strategy.diagnostic {
        Diagnostic::NotApplicable => None,
        Diagnostic::BiasPct { fast, slow } => match (fast.latest(&ctx), slow.latest(&ctx)) {
            (Some(f), Some(s)) => predicates::bias_pct(f, s),
            _ => None,
        },
    };

    let instrument = series.instrument();
    ScreenOutcome::Match(MatchRecord {
        as_of: last.date,
        instrument_id: instrument.id.clone(),
        name: instrument.name.clone(),
        market: instrument.market,
        close: round2(last.close),
        volume_lots: last_volume_lots.floor() as u64,
        strategy: strategy.name.clone(),
        note: strategy.note.clone(),
        bias_pct: bias,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BarSeries, Instrument, MarketTier};
    use crate::indicators::make_bars;
    use crate::strategy::catalog;

    fn series(closes: &[f64], volume: u64) -> BarSeries {
        BarSeries::new(
            Instrument::new("2330", "TSMC", MarketTier::Primary),
            make_bars(closes, volume),
        )
        .unwrap()
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5).collect()
    }

    #[test]
    fn insufficient_history_boundary() {
        let strategy = catalog::basing_retest();
        let short = series(&rising(199), 600_000);
        match evaluate(&short, &strategy, &EngineConfig::default()) {
            ScreenOutcome::NoMatch(NoMatchReason::InsufficientHistory { required, actual }) => {
                assert_eq!(required, 200);
                assert_eq!(actual, 199);
            }
            other => panic!("expected InsufficientHistory, got {other:?}"),
        }
        // At exactly min_history the gate opens and predicates run.
        let enough = series(&rising(200), 600_000);
        let outcome = evaluate(&enough, &strategy, &EngineConfig::default());
        assert!(
            !matches!(
                outcome,
                ScreenOutcome::NoMatch(NoMatchReason::InsufficientHistory { .. })
            ),
            "gate should pass at the boundary: {outcome:?}"
        );
    }

    #[test]
    fn degenerate_last_close_is_compute_error() {
        let mut bars = make_bars(&rising(260), 600_000);
        bars.last_mut().unwrap().close = f64::NAN;
        let s = BarSeries::new(Instrument::new("1234", "Bad", MarketTier::Secondary), bars).unwrap();
        let outcome = evaluate(&s, &catalog::momentum_ignition(), &EngineConfig::default());
        assert!(matches!(
            outcome,
            ScreenOutcome::NoMatch(NoMatchReason::ComputeError(_))
        ));
    }

    #[test]
    fn short_circuit_reports_first_failure() {
        // 400 lots: basing-retest fails its volume floor before anything else.
        let s = series(&rising(220), 400_000);
        match evaluate(&s, &catalog::basing_retest(), &EngineConfig::default()) {
            ScreenOutcome::NoMatch(NoMatchReason::PredicateFailed { index, name }) => {
                assert_eq!(index, 0);
                assert_eq!(name, "volume_floor");
            }
            other => panic!("expected volume_floor failure, got {other:?}"),
        }
    }

    #[test]
    fn match_record_rounds_close_and_floors_lots() {
        // Clean uptrend, rich volume: upper-right-breakout matches.
        let mut closes = rising(260);
        *closes.last_mut().unwrap() = 230.456;
        let s = series(&closes, 1_200_900); // 1200.9 lots
        match evaluate(&s, &catalog::upper_right_breakout(), &EngineConfig::default()) {
            ScreenOutcome::Match(record) => {
                assert_eq!(record.close, 230.46);
                assert_eq!(record.volume_lots, 1200);
                assert_eq!(record.strategy, "upper-right-breakout");
                assert_eq!(record.bias_pct, None);
                assert_eq!(record.as_of, s.last().unwrap().date);
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn momentum_ignition_reports_bias() {
        let s = series(&rising(260), 1_200_000);
        // Flat volume fails the volume acceleration check; rising volume passes.
        let mut bars = make_bars(&rising(260), 0);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.volume = 1_000_000 + i as u64 * 1_000;
        }
        let accelerating =
            BarSeries::new(Instrument::new("2330", "TSMC", MarketTier::Primary), bars).unwrap();

        assert!(matches!(
            evaluate(&s, &catalog::momentum_ignition(), &EngineConfig::default()),
            ScreenOutcome::NoMatch(NoMatchReason::PredicateFailed { index: 3, .. })
        ));

        match evaluate(&accelerating, &catalog::momentum_ignition(), &EngineConfig::default()) {
            ScreenOutcome::Match(record) => {
                let bias = record.bias_pct.expect("momentum-ignition reports bias");
                // Linear slope 0.5 over 260 bars: MA5 = close - 1, MA200 = close - 49.75.
                let expected = (228.5_f64 - 179.75) / 179.75 * 100.0;
                assert!((bias - expected).abs() < 1e-9, "bias {bias} vs {expected}");
            }
            other => panic!("expected match, got {other:?}"),
        }
    }
}
