//! Statistics of a value against a trailing window of the values before it.

use serde::{Deserialize, Serialize};
use midgrid_core::traits::Indicator;

/// Position of a value relative to the values preceding it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingStats {
    /// Share of prior values strictly below the current one, 0-100
    pub percentile: f64,
    /// Distance from the prior mean in sample standard deviations.
    /// `None` when the prior values have no spread.
    pub zscore: Option<f64>,
    /// Percentile lines of the prior values
    pub bands: PercentileBands,
}

/// 20th, 50th and 80th percentiles, linearly interpolated between the
/// closest ranks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileBands {
    pub p20: f64,
    pub p50: f64,
    pub p80: f64,
}

impl PercentileBands {
    /// Bands of `values`, which must be non-empty.
    pub fn of(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self {
            p20: interpolate(&sorted, 0.2),
            p50: interpolate(&sorted, 0.5),
            p80: interpolate(&sorted, 0.8),
        }
    }
}

fn interpolate(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Ranks each value against the `window` values before it.
///
/// The current value is never part of its own reference window, so the
/// first output appears at index `window`.
#[derive(Debug, Clone)]
pub struct TrailingRank {
    window: usize,
}

impl TrailingRank {
    /// Create a trailing rank over `window` prior values.
    pub fn new(window: usize) -> Self {
        assert!(window > 1, "Window must be greater than 1");
        Self { window }
    }
}

impl Indicator for TrailingRank {
    type Output = TrailingStats;

    fn calculate(&self, data: &[f64]) -> Vec<TrailingStats> {
        if data.len() < self.period() {
            return vec![];
        }

        let n = self.window as f64;
        (self.window..data.len())
            .map(|i| {
                let prior = &data[i - self.window..i];
                let current = data[i];

                let below = prior.iter().filter(|&&v| v < current).count();
                let percentile = below as f64 / n * 100.0;

                let mean = prior.iter().sum::<f64>() / n;
                let variance =
                    prior.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
                let std_dev = variance.sqrt();
                let zscore = (std_dev > 0.0).then(|| (current - mean) / std_dev);

                TrailingStats {
                    percentile,
                    zscore,
                    bands: PercentileBands::of(prior),
                }
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.window + 1
    }

    fn name(&self) -> &str {
        "TrailingRank"
    }
}
