//! Volatility indicators.

use midgrid_core::traits::Indicator;
use midgrid_core::types::PriceBar;

use crate::moving_average::Sma;

/// Average True Range (ATR) as a simple mean of true ranges.
///
/// The first bar has no previous close, so its true range is its own
/// `high - low`. That keeps one true range per bar and lets the first ATR
/// appear at index `period - 1`.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    /// Create a new ATR indicator.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// True range of each bar against the previous bar's close.
    pub fn true_ranges(bars: &[PriceBar]) -> Vec<f64> {
        Self::true_ranges_masked(bars, &vec![true; bars.len()])
            .into_iter()
            .flatten()
            .collect()
    }

    /// True ranges of the `usable` bars; `None` elsewhere.
    ///
    /// A bar following an unusable one has no previous close, so the true
    /// range restarts from its own `high - low`.
    pub fn true_ranges_masked(bars: &[PriceBar], usable: &[bool]) -> Vec<Option<f64>> {
        bars.iter()
            .enumerate()
            .map(|(i, bar)| {
                if !usable[i] {
                    return None;
                }
                let prev_close = i
                    .checked_sub(1)
                    .filter(|&p| usable[p])
                    .map(|p| bars[p].close);
                Some(bar.true_range(prev_close))
            })
            .collect()
    }

    /// Calculate ATR from bars.
    pub fn calculate_bars(&self, bars: &[PriceBar]) -> Vec<f64> {
        self.calculate(&Self::true_ranges(bars))
    }
}

impl Indicator for Atr {
    type Output = f64;

    /// `data` holds true ranges, one per bar.
    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        Sma::new(self.period).calculate(data)
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "ATR"
    }
}
