//! Mid-price momentum.

use serde::{Deserialize, Serialize};
use midgrid_core::traits::Indicator;

use crate::moving_average::Ema;

/// MPMI output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MpmiPoint {
    /// Fast EMA minus slow EMA
    pub line: f64,
    /// EMA of the line
    pub signal: f64,
    /// Line minus signal
    pub histogram: f64,
}

/// A crossing of the MPMI line through its signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MpmiCross {
    /// Line moved above the signal
    Golden,
    /// Line moved below the signal
    Death,
}

impl MpmiCross {
    /// Cross between two consecutive points, if any.
    pub fn between(previous: &MpmiPoint, current: &MpmiPoint) -> Option<Self> {
        if current.line > current.signal && previous.line <= previous.signal {
            Some(MpmiCross::Golden)
        } else if current.line < current.signal && previous.line >= previous.signal {
            Some(MpmiCross::Death)
        } else {
            None
        }
    }
}

/// Mid-Price Momentum Indicator.
///
/// MACD computed on mid-prices instead of closes.
#[derive(Debug, Clone)]
pub struct Mpmi {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Mpmi {
    /// Create an MPMI with the usual (12, 26, 9) periods.
    pub fn new() -> Self {
        Self::with_periods(12, 26, 9)
    }

    /// Create an MPMI with custom periods.
    pub fn with_periods(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast > 0 && slow > 0 && signal > 0);
        assert!(fast < slow, "Fast period must be less than slow period");
        Self {
            fast_period: fast,
            slow_period: slow,
            signal_period: signal,
        }
    }
}

impl Default for Mpmi {
    fn default() -> Self {
        Self::new()
    }
}

impl Indicator for Mpmi {
    type Output = MpmiPoint;

    fn calculate(&self, data: &[f64]) -> Vec<MpmiPoint> {
        if data.len() < self.period() {
            return vec![];
        }

        let fast_ema = Ema::new(self.fast_period).calculate(data);
        let slow_ema = Ema::new(self.slow_period).calculate(data);

        // Align the EMAs (fast has more values)
        let offset = self.slow_period - self.fast_period;
        let line: Vec<f64> = fast_ema[offset..]
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect();

        let signal_line = Ema::new(self.signal_period).calculate(&line);

        let offset = self.signal_period - 1;
        line[offset..]
            .iter()
            .zip(signal_line.iter())
            .map(|(&line, &signal)| MpmiPoint {
                line,
                signal,
                histogram: line - signal,
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }

    fn name(&self) -> &str {
        "MPMI"
    }
}
