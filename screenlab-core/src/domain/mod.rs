//! Domain types: bars, bar series, instruments.

pub mod bar;
pub mod instrument;
pub mod series;

pub use bar::Bar;
pub use instrument::{Instrument, MarketTier};
pub use series::{BarSeries, SeriesError};
