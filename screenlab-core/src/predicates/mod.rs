//! Predicate library — small, composable checks over indicator values.
//!
//! Every predicate is a total function that fails closed: whenever a required
//! indicator value is undefined (NaN warmup, series too short, missing data),
//! the predicate returns false instead of panicking or guessing. Strategies
//! are ordered lists of [`PredicateSpec`] values, so new setups are data, not
//! code.

use crate::engine::EngineConfig;
use crate::indicators::{IndicatorStore, Metric};
use serde::{Deserialize, Serialize};

/// Everything one predicate evaluation may read.
///
/// The last close / volume snapshot is taken once per engine call so every
/// predicate in a strategy observes the same "as of" state.
pub struct EvalContext<'a> {
    pub store: &'a IndicatorStore<'a>,
    pub last_close: f64,
    pub last_volume_lots: f64,
    pub config: &'a EngineConfig,
}

/// Operand of a predicate: the latest close, or a rolling indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Source {
    LastClose,
    Indicator { metric: Metric, window: usize },
}

impl Source {
    pub fn ma(window: usize) -> Self {
        Source::Indicator {
            metric: Metric::CloseSma,
            window,
        }
    }

    pub fn vol_sma(window: usize) -> Self {
        Source::Indicator {
            metric: Metric::VolumeSmaLots,
            window,
        }
    }

    pub fn high_max(window: usize) -> Self {
        Source::Indicator {
            metric: Metric::HighMax,
            window,
        }
    }

    pub fn close_max(window: usize) -> Self {
        Source::Indicator {
            metric: Metric::CloseMax,
            window,
        }
    }

    /// Latest value, `None` when undefined.
    pub fn latest(&self, ctx: &EvalContext) -> Option<f64> {
        match *self {
            Source::LastClose => Some(ctx.last_close).filter(|v| v.is_finite()),
            Source::Indicator { metric, window } => ctx.store.latest(metric, window),
        }
    }

    /// Most recent `n` values, oldest first. May contain NaN or be short.
    pub fn tail(&self, ctx: &EvalContext, n: usize) -> Vec<f64> {
        match *self {
            // Close series == SMA with window 1.
            Source::LastClose => ctx.store.tail(Metric::CloseSma, 1, n),
            Source::Indicator { metric, window } => ctx.store.tail(metric, window, n),
        }
    }
}

/// Which volume threshold a [`PredicateSpec::VolumeFloor`] compares against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FloorLots {
    /// Engine-config floor, falling back to a per-strategy default.
    /// With neither set, the floor is disabled and the predicate passes.
    Config { default: Option<f64> },
    /// Fixed threshold that ignores the engine config.
    Fixed(f64),
}

/// Comparison direction for volume floors. The source strategies mix `>` and
/// `>=` for nominally the same concept; both are kept as explicit policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloorPolicy {
    /// Volume strictly greater than the floor.
    Strict,
    /// Volume not less than the floor.
    AtLeast,
}

/// Relative deviation of `fast` from `slow`, in percent.
///
/// `None` when either input is undefined or `slow` is zero, so callers fail
/// closed rather than divide by zero.
pub fn bias_pct(fast: f64, slow: f64) -> Option<f64> {
    if !fast.is_finite() || !slow.is_finite() || slow == 0.0 {
        return None;
    }
    Some((fast - slow) / slow * 100.0)
}

/// One condition in a strategy's ordered predicate list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PredicateSpec {
    /// Last close strictly greater than every listed source.
    AboveAll { over: Vec<Source> },

    /// Latest values strictly decreasing along the chain
    /// (e.g. close > MA5 > MA20 > MA60).
    StrictOrder { chain: Vec<Source> },

    /// The last `run + 1` values of the source rise strictly: all `run`
    /// successive differences defined and positive. Fewer defined differences
    /// than `run` is a failure, never a vacuous pass.
    ConsecutiveRise { source: Source, run: usize },

    /// Minimum close over the trailing `price_lookback` bars strictly below
    /// the minimum of `indicator` over its trailing lookback — price dipped
    /// under its own moving average within the window.
    RetestBelow {
        price_lookback: usize,
        indicator: Source,
        indicator_lookback: usize,
    },

    /// `(fast - slow) / slow × 100` strictly below `max_pct`.
    BiasUnder {
        fast: Source,
        slow: Source,
        max_pct: f64,
    },

    /// `fast` strictly above `extreme × fraction` — near the N-day extreme.
    NearExtreme {
        fast: Source,
        extreme: Source,
        fraction: f64,
    },

    /// `|a - b| / b × 100` strictly below `max_pct` on each of the last
    /// `days` bars — the two averages compressed together.
    ConvergenceUnder {
        a: Source,
        b: Source,
        max_pct: f64,
        days: usize,
    },

    /// Volume (in lots) over `window` bars (window 1 = the last bar) compared
    /// against a floor.
    VolumeFloor {
        window: usize,
        lots: FloorLots,
        policy: FloorPolicy,
    },
}

impl PredicateSpec {
    /// Stable name used in no-match reasons.
    pub fn name(&self) -> &'static str {
        match self {
            PredicateSpec::AboveAll { .. } => "above_all",
            PredicateSpec::StrictOrder { .. } => "strict_order",
            PredicateSpec::ConsecutiveRise { .. } => "consecutive_rise",
            PredicateSpec::RetestBelow { .. } => "retest_below",
            PredicateSpec::BiasUnder { .. } => "bias_under",
            PredicateSpec::NearExtreme { .. } => "near_extreme",
            PredicateSpec::ConvergenceUnder { .. } => "convergence_under",
            PredicateSpec::VolumeFloor { .. } => "volume_floor",
        }
    }

    /// Evaluate against one context. Never panics; undefined inputs fail.
    pub fn evaluate(&self, ctx: &EvalContext) -> bool {
        match self {
            PredicateSpec::AboveAll { over } => {
                if !ctx.last_close.is_finite() || over.is_empty() {
                    return false;
                }
                over.iter().all(|source| match source.latest(ctx) {
                    Some(v) => ctx.last_close > v,
                    None => false,
                })
            }

            PredicateSpec::StrictOrder { chain } => {
                if chain.len() < 2 {
                    return false;
                }
                let mut values = Vec::with_capacity(chain.len());
                for source in chain {
                    match source.latest(ctx) {
                        Some(v) => values.push(v),
                        None => return false,
                    }
                }
                values.windows(2).all(|pair| pair[0] > pair[1])
            }

            PredicateSpec::ConsecutiveRise { source, run } => {
                if *run == 0 {
                    return false;
                }
                let tail = source.tail(ctx, run + 1);
                if tail.len() < run + 1 {
                    return false;
                }
                tail.windows(2).all(|pair| {
                    let diff = pair[1] - pair[0];
                    diff.is_finite() && diff > 0.0
                })
            }

            PredicateSpec::RetestBelow {
                price_lookback,
                indicator,
                indicator_lookback,
            } => {
                let min_price = match tail_min(&Source::LastClose.tail(ctx, *price_lookback), *price_lookback) {
                    Some(v) => v,
                    None => return false,
                };
                let min_indicator = match tail_min(&indicator.tail(ctx, *indicator_lookback), *indicator_lookback) {
                    Some(v) => v,
                    None => return false,
                };
                min_price < min_indicator
            }

            PredicateSpec::BiasUnder { fast, slow, max_pct } => {
                let fast = match fast.latest(ctx) {
                    Some(v) => v,
                    None => return false,
                };
                let slow = match slow.latest(ctx) {
                    Some(v) => v,
                    None => return false,
                };
                match bias_pct(fast, slow) {
                    Some(bias) => bias < *max_pct,
                    None => false,
                }
            }

            PredicateSpec::NearExtreme {
                fast,
                extreme,
                fraction,
            } => match (fast.latest(ctx), extreme.latest(ctx)) {
                (Some(f), Some(e)) => f > e * fraction,
                _ => false,
            },

            PredicateSpec::ConvergenceUnder { a, b, max_pct, days } => {
                if *days == 0 {
                    return false;
                }
                let ta = a.tail(ctx, *days);
                let tb = b.tail(ctx, *days);
                if ta.len() < *days || tb.len() < *days {
                    return false;
                }
                ta.iter().zip(tb.iter()).all(|(&va, &vb)| {
                    match bias_pct(va, vb) {
                        Some(bias) => bias.abs() < *max_pct,
                        None => false,
                    }
                })
            }

            PredicateSpec::VolumeFloor {
                window,
                lots,
                policy,
            } => {
                let floor = match lots {
                    FloorLots::Config { default } => ctx.config.min_volume_lots.or(*default),
                    FloorLots::Fixed(v) => Some(*v),
                };
                let floor = match floor {
                    Some(v) => v,
                    // No floor configured anywhere: the check is disabled.
                    None => return true,
                };
                let volume = if *window <= 1 {
                    ctx.last_volume_lots
                } else {
                    match ctx.store.latest(Metric::VolumeSmaLots, *window) {
                        Some(v) => v,
                        None => return false,
                    }
                };
                if !volume.is_finite() {
                    return false;
                }
                match policy {
                    FloorPolicy::Strict => volume > floor,
                    FloorPolicy::AtLeast => volume >= floor,
                }
            }
        }
    }
}

/// Minimum over a tail slice, failing closed on short or NaN-bearing input.
fn tail_min(tail: &[f64], expected_len: usize) -> Option<f64> {
    if tail.len() < expected_len || expected_len == 0 {
        return None;
    }
    let mut min = f64::INFINITY;
    for &v in tail {
        if v.is_nan() {
            return None;
        }
        min = min.min(v);
    }
    Some(min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BarSeries, Instrument, MarketTier};
    use crate::engine::EngineConfig;
    use crate::indicators::make_bars;

    fn series(closes: &[f64], volume: u64) -> BarSeries {
        BarSeries::new(
            Instrument::new("2330", "TSMC", MarketTier::Primary),
            make_bars(closes, volume),
        )
        .unwrap()
    }

    fn eval_on(series: &BarSeries, config: &EngineConfig, pred: &PredicateSpec) -> bool {
        let store = IndicatorStore::new(series);
        let last = series.last().expect("non-empty series");
        let ctx = EvalContext {
            store: &store,
            last_close: last.close,
            last_volume_lots: last.volume as f64 / 1000.0,
            config,
        };
        pred.evaluate(&ctx)
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5).collect()
    }

    #[test]
    fn above_all_passes_in_uptrend() {
        let s = series(&rising(80), 600_000);
        let pred = PredicateSpec::AboveAll {
            over: vec![Source::ma(5), Source::ma(20), Source::ma(60)],
        };
        assert!(eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn above_all_fails_closed_without_history() {
        // MA60 undefined on 30 bars.
        let s = series(&rising(30), 600_000);
        let pred = PredicateSpec::AboveAll {
            over: vec![Source::ma(5), Source::ma(60)],
        };
        assert!(!eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn strict_order_holds_in_uptrend() {
        let s = series(&rising(80), 600_000);
        let pred = PredicateSpec::StrictOrder {
            chain: vec![Source::LastClose, Source::ma(5), Source::ma(20), Source::ma(60)],
        };
        assert!(eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn strict_order_rejects_equal_values() {
        // Flat series: close == MA5 == MA20.
        let s = series(&vec![50.0; 80], 600_000);
        let pred = PredicateSpec::StrictOrder {
            chain: vec![Source::LastClose, Source::ma(5), Source::ma(20)],
        };
        assert!(!eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn consecutive_rise_passes_on_rising_ma() {
        let s = series(&rising(40), 600_000);
        let pred = PredicateSpec::ConsecutiveRise {
            source: Source::ma(20),
            run: 10,
        };
        assert!(eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn consecutive_rise_fails_on_flat() {
        let s = series(&vec![50.0; 40], 600_000);
        let pred = PredicateSpec::ConsecutiveRise {
            source: Source::ma(20),
            run: 10,
        };
        assert!(!eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn consecutive_rise_fails_when_differences_undefined() {
        // MA20 has exactly 6 defined points on 25 bars; a run of 10 needs 11.
        let s = series(&rising(25), 600_000);
        let pred = PredicateSpec::ConsecutiveRise {
            source: Source::ma(20),
            run: 10,
        };
        assert!(!eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn consecutive_rise_fails_on_short_series() {
        let s = series(&rising(5), 600_000);
        let pred = PredicateSpec::ConsecutiveRise {
            source: Source::LastClose,
            run: 10,
        };
        assert!(!eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn retest_below_detects_dip_under_ma() {
        // Uptrend, then a sharp dip below the 5-bar MA inside the lookback.
        let mut closes = rising(40);
        closes[36] = 80.0;
        closes[37] = 82.0;
        closes[38] = 115.0;
        closes[39] = 120.0;
        let s = series(&closes, 600_000);
        let pred = PredicateSpec::RetestBelow {
            price_lookback: 10,
            indicator: Source::ma(5),
            indicator_lookback: 10,
        };
        assert!(eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn retest_below_fails_in_clean_uptrend() {
        // Price never dips under its own MA in a monotonic rise.
        let s = series(&rising(40), 600_000);
        let pred = PredicateSpec::RetestBelow {
            price_lookback: 10,
            indicator: Source::ma(5),
            indicator_lookback: 10,
        };
        assert!(!eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn retest_below_fails_closed_on_warmup_nans() {
        // MA20 tail of 20 still contains warmup NaNs on 30 bars.
        let s = series(&rising(30), 600_000);
        let pred = PredicateSpec::RetestBelow {
            price_lookback: 20,
            indicator: Source::ma(20),
            indicator_lookback: 20,
        };
        assert!(!eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn bias_under_threshold() {
        let s = series(&rising(250), 600_000);
        // Linear slope 0.5: MA5 - MA200 = 0.5 * (199 - 4) / 2 = 48.75 over MA200.
        let tight = PredicateSpec::BiasUnder {
            fast: Source::ma(5),
            slow: Source::ma(200),
            max_pct: 10.0,
        };
        let loose = PredicateSpec::BiasUnder {
            fast: Source::ma(5),
            slow: Source::ma(200),
            max_pct: 50.0,
        };
        assert!(!eval_on(&s, &EngineConfig::default(), &tight));
        assert!(eval_on(&s, &EngineConfig::default(), &loose));
    }

    #[test]
    fn bias_under_fails_closed_without_slow_ma() {
        let s = series(&rising(100), 600_000);
        let pred = PredicateSpec::BiasUnder {
            fast: Source::ma(5),
            slow: Source::ma(200),
            max_pct: 99.0,
        };
        assert!(!eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn bias_pct_raw_value() {
        assert_eq!(bias_pct(110.0, 100.0), Some(10.0));
        assert_eq!(bias_pct(90.0, 100.0), Some(-10.0));
        assert_eq!(bias_pct(1.0, 0.0), None);
        assert_eq!(bias_pct(f64::NAN, 100.0), None);
    }

    #[test]
    fn near_extreme_at_high() {
        let s = series(&rising(250), 600_000);
        let pred = PredicateSpec::NearExtreme {
            fast: Source::close_max(10),
            extreme: Source::close_max(200),
            fraction: 0.95,
        };
        assert!(eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn near_extreme_far_from_high() {
        // Peak early, then a long slide: the 10-day close max sits far
        // beneath 95% of the 200-day max.
        let mut closes = vec![200.0; 20];
        closes.extend((0..230).map(|i| 180.0 - i as f64 * 0.5));
        let s = series(&closes, 600_000);
        let pred = PredicateSpec::NearExtreme {
            fast: Source::close_max(10),
            extreme: Source::close_max(200),
            fraction: 0.95,
        };
        assert!(!eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn convergence_under_flat_series() {
        let s = series(&vec![50.0; 300], 600_000);
        let pred = PredicateSpec::ConvergenceUnder {
            a: Source::ma(20),
            b: Source::ma(60),
            max_pct: 10.0,
            days: 10,
        };
        assert!(eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn convergence_under_rejects_divergence() {
        // Steep slope keeps MA20 well above MA60.
        let closes: Vec<f64> = (0..300).map(|i| 10.0 + i as f64).collect();
        let s = series(&closes, 600_000);
        let pred = PredicateSpec::ConvergenceUnder {
            a: Source::ma(20),
            b: Source::ma(60),
            max_pct: 5.0,
            days: 10,
        };
        assert!(!eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn convergence_under_fails_closed_on_warmup() {
        // MA60 lacks 10 defined points on 65 bars.
        let s = series(&rising(65), 600_000);
        let pred = PredicateSpec::ConvergenceUnder {
            a: Source::ma(20),
            b: Source::ma(60),
            max_pct: 50.0,
            days: 10,
        };
        assert!(!eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn volume_floor_strict_vs_at_least() {
        let s = series(&rising(10), 500_000); // exactly 500 lots
        let strict = PredicateSpec::VolumeFloor {
            window: 1,
            lots: FloorLots::Fixed(500.0),
            policy: FloorPolicy::Strict,
        };
        let at_least = PredicateSpec::VolumeFloor {
            window: 1,
            lots: FloorLots::Fixed(500.0),
            policy: FloorPolicy::AtLeast,
        };
        assert!(!eval_on(&s, &EngineConfig::default(), &strict));
        assert!(eval_on(&s, &EngineConfig::default(), &at_least));
    }

    #[test]
    fn volume_floor_config_overrides_default() {
        let s = series(&rising(10), 600_000); // 600 lots
        let pred = PredicateSpec::VolumeFloor {
            window: 1,
            lots: FloorLots::Config {
                default: Some(500.0),
            },
            policy: FloorPolicy::Strict,
        };
        assert!(eval_on(&s, &EngineConfig::default(), &pred));
        let raised = EngineConfig {
            min_volume_lots: Some(1000.0),
        };
        assert!(!eval_on(&s, &raised, &pred));
    }

    #[test]
    fn volume_floor_disabled_when_unconfigured() {
        let s = series(&rising(10), 1_000); // 1 lot
        let pred = PredicateSpec::VolumeFloor {
            window: 1,
            lots: FloorLots::Config { default: None },
            policy: FloorPolicy::Strict,
        };
        assert!(eval_on(&s, &EngineConfig::default(), &pred));
    }

    #[test]
    fn volume_floor_sma_window() {
        let s = series(&rising(10), 1_200_000); // 1200 lots every day
        let pred = PredicateSpec::VolumeFloor {
            window: 5,
            lots: FloorLots::Fixed(1000.0),
            policy: FloorPolicy::Strict,
        };
        assert!(eval_on(&s, &EngineConfig::default(), &pred));
        let thin = series(&rising(3), 1_200_000); // SMA5 undefined
        assert!(!eval_on(&thin, &EngineConfig::default(), &pred));
    }
}
