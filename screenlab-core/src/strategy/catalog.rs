//! The five canonical setups, expressed as data.
//!
//! Each setup is an ordered predicate list over the shared library; adding a
//! sixth needs no new code. Minimum history pads the longest moving average
//! with enough room for the multi-day trend checks on top of it.

use super::{Diagnostic, StrategyDefinition};
use crate::predicates::{FloorLots, FloorPolicy, PredicateSpec, Source};

/// Volume surge, bullish stack, and a completed base retest under the 20-day
/// average, capped at 40% above the yearly average to avoid chasing.
pub fn basing_retest() -> StrategyDefinition {
    StrategyDefinition::new(
        "basing-retest",
        "volume surge with bullish stack and completed base retest",
        200,
        vec![
            PredicateSpec::VolumeFloor {
                window: 1,
                lots: FloorLots::Config {
                    default: Some(500.0),
                },
                policy: FloorPolicy::Strict,
            },
            PredicateSpec::StrictOrder {
                chain: vec![
                    Source::LastClose,
                    Source::ma(5),
                    Source::ma(20),
                    Source::ma(60),
                ],
            },
            PredicateSpec::RetestBelow {
                price_lookback: 20,
                indicator: Source::ma(20),
                indicator_lookback: 20,
            },
            // close < MA200 × 1.4
            PredicateSpec::BiasUnder {
                fast: Source::LastClose,
                slow: Source::ma(200),
                max_pct: 40.0,
            },
            PredicateSpec::ConsecutiveRise {
                source: Source::ma(200),
                run: 10,
            },
        ],
        Diagnostic::NotApplicable,
    )
}

/// Price above the whole moving-average stack with the yearly average and
/// volume both accelerating. The only setup that reports the 5/200 bias.
pub fn momentum_ignition() -> StrategyDefinition {
    StrategyDefinition::new(
        "momentum-ignition",
        "price above full stack, yearly average and volume accelerating",
        250,
        vec![
            PredicateSpec::AboveAll {
                over: vec![
                    Source::ma(5),
                    Source::ma(20),
                    Source::ma(60),
                    Source::ma(120),
                ],
            },
            PredicateSpec::BiasUnder {
                fast: Source::ma(5),
                slow: Source::ma(200),
                max_pct: 30.0,
            },
            PredicateSpec::ConsecutiveRise {
                source: Source::ma(200),
                run: 10,
            },
            PredicateSpec::ConsecutiveRise {
                source: Source::vol_sma(20),
                run: 10,
            },
        ],
        Diagnostic::BiasPct {
            fast: Source::ma(5),
            slow: Source::ma(200),
        },
    )
}

/// Bullish alignment with the recent high pressing against the 60-day high —
/// little overhead supply left.
pub fn bullish_no_overhang() -> StrategyDefinition {
    StrategyDefinition::new(
        "bullish-no-overhang",
        "bullish alignment pressing the 60-day high",
        250,
        vec![
            PredicateSpec::VolumeFloor {
                window: 1,
                lots: FloorLots::Config {
                    default: Some(500.0),
                },
                policy: FloorPolicy::AtLeast,
            },
            PredicateSpec::AboveAll {
                over: vec![Source::ma(5), Source::ma(20), Source::ma(60)],
            },
            PredicateSpec::AboveAll {
                over: vec![Source::ma(120)],
            },
            PredicateSpec::ConsecutiveRise {
                source: Source::ma(120),
                run: 3,
            },
            PredicateSpec::NearExtreme {
                fast: Source::high_max(5),
                extreme: Source::high_max(60),
                fraction: 0.9,
            },
        ],
        Diagnostic::NotApplicable,
    )
}

/// Moving averages compressed into a band near the 200-day high while the
/// yearly average keeps rising — a coiled breakout candidate.
pub fn compression_breakout() -> StrategyDefinition {
    StrategyDefinition::new(
        "compression-breakout",
        "compressed averages near the 200-day high",
        250,
        vec![
            // Floor only applies when the engine config provides one.
            PredicateSpec::VolumeFloor {
                window: 1,
                lots: FloorLots::Config { default: None },
                policy: FloorPolicy::Strict,
            },
            PredicateSpec::NearExtreme {
                fast: Source::ma(5),
                extreme: Source::high_max(200),
                fraction: 0.9,
            },
            PredicateSpec::ConvergenceUnder {
                a: Source::ma(20),
                b: Source::ma(60),
                max_pct: 10.0,
                days: 10,
            },
            PredicateSpec::ConvergenceUnder {
                a: Source::ma(60),
                b: Source::ma(120),
                max_pct: 5.0,
                days: 10,
            },
            PredicateSpec::ConsecutiveRise {
                source: Source::ma(200),
                run: 10,
            },
        ],
        Diagnostic::NotApplicable,
    )
}

/// Recent closes within 5% of the 200-day close high on real volume, with
/// both the 20-day and yearly averages still climbing.
pub fn upper_right_breakout() -> StrategyDefinition {
    StrategyDefinition::new(
        "upper-right-breakout",
        "closing at the upper right of the yearly range",
        250,
        vec![
            PredicateSpec::NearExtreme {
                fast: Source::close_max(10),
                extreme: Source::close_max(200),
                fraction: 0.95,
            },
            PredicateSpec::ConsecutiveRise {
                source: Source::ma(20),
                run: 3,
            },
            PredicateSpec::VolumeFloor {
                window: 5,
                lots: FloorLots::Fixed(1000.0),
                policy: FloorPolicy::Strict,
            },
            PredicateSpec::ConsecutiveRise {
                source: Source::ma(200),
                run: 5,
            },
            PredicateSpec::AboveAll {
                over: vec![Source::ma(5)],
            },
        ],
        Diagnostic::NotApplicable,
    )
}

/// All canonical strategies, in catalog order.
pub fn all() -> Vec<StrategyDefinition> {
    vec![
        basing_retest(),
        momentum_ignition(),
        bullish_no_overhang(),
        compression_breakout(),
        upper_right_breakout(),
    ]
}

/// Look up a canonical strategy by its stable name.
pub fn by_name(name: &str) -> Option<StrategyDefinition> {
    all().into_iter().find(|s| s.name == name)
}
