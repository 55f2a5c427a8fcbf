//! IndicatorStore — on-demand, memoized indicator series for one evaluation.

use super::rolling::{rolling_max, rolling_mean, rolling_min};
use crate::domain::BarSeries;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;

/// Shares per board lot. Raw volume is divided by this before any volume
/// averaging so rolling volume means work on true decimal lots.
pub const SHARES_PER_LOT: f64 = 1000.0;

/// Supported rolling metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Simple moving average of close.
    CloseSma,
    /// Simple moving average of volume expressed in decimal board lots.
    VolumeSmaLots,
    /// Rolling maximum of high.
    HighMax,
    /// Rolling maximum of close.
    CloseMax,
    /// Rolling minimum of close.
    CloseMin,
}

/// Computes and memoizes rolling indicator series over one [`BarSeries`].
///
/// Series are computed lazily on first request and cached for the duration of
/// one screening-engine call; the store exposes no mutation and the underlying
/// bars are immutable, so repeated reads always agree.
pub struct IndicatorStore<'a> {
    series: &'a BarSeries,
    cache: RefCell<HashMap<(Metric, usize), Vec<f64>>>,
}

impl<'a> IndicatorStore<'a> {
    pub fn new(series: &'a BarSeries) -> Self {
        Self {
            series,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Indicator value at a bar index. `None` when the index is out of bounds
    /// or the window is not yet full (NaN warmup).
    pub fn value(&self, metric: Metric, window: usize, index: usize) -> Option<f64> {
        self.with_series(metric, window, |values| {
            values.get(index).copied().filter(|v| !v.is_nan())
        })
    }

    /// Most recent indicator value, `None` when undefined.
    pub fn latest(&self, metric: Metric, window: usize) -> Option<f64> {
        let n = self.series.len();
        if n == 0 {
            return None;
        }
        self.value(metric, window, n - 1)
    }

    /// The most recent `n` values of the indicator series, oldest first.
    ///
    /// May contain NaN (warmup) and may be shorter than `n` when the bar
    /// series itself is shorter; callers fail closed on both.
    pub fn tail(&self, metric: Metric, window: usize, n: usize) -> Vec<f64> {
        self.with_series(metric, window, |values| {
            let start = values.len().saturating_sub(n);
            values[start..].to_vec()
        })
    }

    fn with_series<R>(&self, metric: Metric, window: usize, f: impl FnOnce(&[f64]) -> R) -> R {
        let key = (metric, window);
        if let Some(values) = self.cache.borrow().get(&key) {
            return f(values);
        }
        let values = self.compute(metric, window);
        let result = f(&values);
        self.cache.borrow_mut().insert(key, values);
        result
    }

    fn compute(&self, metric: Metric, window: usize) -> Vec<f64> {
        let bars = self.series.bars();
        match metric {
            Metric::CloseSma => {
                let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
                rolling_mean(&closes, window)
            }
            Metric::VolumeSmaLots => {
                let lots: Vec<f64> = bars.iter().map(|b| b.volume as f64 / SHARES_PER_LOT).collect();
                rolling_mean(&lots, window)
            }
            Metric::HighMax => {
                let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
                rolling_max(&highs, window)
            }
            Metric::CloseMax => {
                let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
                rolling_max(&closes, window)
            }
            Metric::CloseMin => {
                let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
                rolling_min(&closes, window)
            }
        }
    }
}
