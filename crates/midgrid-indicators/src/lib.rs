//! Technical indicators centered on the bar mid-price.
//!
//! This crate provides:
//! - Moving averages (SMA, EMA) and rolling sums
//! - Volatility (ATR) and percentile, z-score and band statistics against a
//!   trailing window
//! - Mid-Price Momentum Indicator (MPMI) and its signal-line crosses
//! - Bar patterns (contraction stars, range breakouts)
//! - The [`IndicatorEngine`], which derives one [`IndicatorRow`] per bar

pub mod amplitude;
pub mod engine;
pub mod momentum;
pub mod moving_average;
pub mod patterns;
pub mod volatility;

pub use amplitude::{PercentileBands, TrailingRank, TrailingStats};
pub use engine::{compute, IndicatorEngine, IndicatorParams, IndicatorRow, Rolling, DEFAULT_WINDOW};
pub use momentum::{Mpmi, MpmiCross, MpmiPoint};
pub use moving_average::{Ema, RollingSum, Sma};
pub use patterns::{Breakout, StarColor};
pub use volatility::Atr;
