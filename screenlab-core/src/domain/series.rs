//! BarSeries — one instrument's ordered daily history.

use super::{Bar, Instrument};
use thiserror::Error;

/// Errors raised when constructing a [`BarSeries`].
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("bar dates not strictly increasing at index {index} ({prev} then {next})")]
    NonIncreasingDates {
        index: usize,
        prev: chrono::NaiveDate,
        next: chrono::NaiveDate,
    },
}

/// Ordered daily bars for one instrument.
///
/// Immutable once constructed. Built per scan iteration from a fetch result
/// and discarded after evaluation — there is no caching across instruments.
///
/// Invariant: dates strictly increasing, one bar per trading day.
#[derive(Debug, Clone)]
pub struct BarSeries {
    instrument: Instrument,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Construct a series, validating the date-ordering invariant.
    pub fn new(instrument: Instrument, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::NonIncreasingDates {
                    index: index + 1,
                    prev: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self { instrument, bars })
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar, if any.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }
}
