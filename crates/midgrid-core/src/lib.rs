//! Core types and traits for mid-price grid analysis.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (PriceBar, RawBar, BarSeries)
//! - Trade side
//! - Error types shared by every component
//! - Core traits for indicators and market-data sources

pub mod types;
pub mod traits;
pub mod error;

pub use error::{MidgridError, MidgridResult};
pub use types::*;
pub use traits::*;
