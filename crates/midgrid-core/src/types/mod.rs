//! Core data types.

mod ohlcv;
mod side;

pub use ohlcv::{BarSeries, PriceBar, RawBar};
pub use side::Side;
