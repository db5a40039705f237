//! Core traits.

mod bar_source;
mod indicator;

pub use bar_source::BarSource;
pub use indicator::Indicator;
