//! Pivot point, support and resistance levels.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use midgrid_core::error::PivotError;
use midgrid_core::types::{BarSeries, PriceBar};

const FIBONACCI_FACTORS: [f64; 3] = [0.382, 0.618, 1.0];

/// Formula used to derive levels from the reference bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotMethod {
    #[default]
    Classic,
    Fibonacci,
}

/// Which bar of a series pivots are computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceBar {
    /// The last completed bar before the latest one
    #[default]
    Previous,
    /// The latest bar
    Latest,
}

/// Name of a member of [`PivotLevels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotLabel {
    S3,
    S2,
    S1,
    Pivot,
    R1,
    R2,
    R3,
}

impl fmt::Display for PivotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PivotLabel::S3 => "S3",
            PivotLabel::S2 => "S2",
            PivotLabel::S1 => "S1",
            PivotLabel::Pivot => "P",
            PivotLabel::R1 => "R1",
            PivotLabel::R2 => "R2",
            PivotLabel::R3 => "R3",
        };
        write!(f, "{name}")
    }
}

/// Pivot and support/resistance levels.
///
/// Always ordered `s3 < s2 < s1 < pivot < r1 < r2 < r3`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotLevels {
    pub method: PivotMethod,
    /// Date of the reference bar
    pub date: NaiveDate,
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

impl PivotLevels {
    /// All members in ascending price order.
    pub fn members(&self) -> [(PivotLabel, f64); 7] {
        [
            (PivotLabel::S3, self.s3),
            (PivotLabel::S2, self.s2),
            (PivotLabel::S1, self.s1),
            (PivotLabel::Pivot, self.pivot),
            (PivotLabel::R1, self.r1),
            (PivotLabel::R2, self.r2),
            (PivotLabel::R3, self.r3),
        ]
    }

    pub fn get(&self, label: PivotLabel) -> f64 {
        match label {
            PivotLabel::S3 => self.s3,
            PivotLabel::S2 => self.s2,
            PivotLabel::S1 => self.s1,
            PivotLabel::Pivot => self.pivot,
            PivotLabel::R1 => self.r1,
            PivotLabel::R2 => self.r2,
            PivotLabel::R3 => self.r3,
        }
    }

    fn is_strictly_ordered(&self) -> bool {
        self.members().windows(2).all(|w| w[0].1 < w[1].1)
    }
}

/// Classic floor-trader pivots from `bar`.
pub fn compute(bar: &PriceBar) -> Result<PivotLevels, PivotError> {
    compute_with(bar, PivotMethod::Classic)
}

/// Pivots from `bar` using `method`.
///
/// Bars violating the OHLC invariant are rejected, as are bars whose range
/// is too small to keep the seven levels apart.
pub fn compute_with(bar: &PriceBar, method: PivotMethod) -> Result<PivotLevels, PivotError> {
    bar.validate()?;

    let (high, low, close) = (bar.high, bar.low, bar.close);
    let range = high - low;
    if range <= 0.0 {
        return Err(PivotError::DegenerateRange { date: bar.date });
    }

    let pivot = (high + low + close) / 3.0;
    let levels = match method {
        PivotMethod::Classic => PivotLevels {
            method,
            date: bar.date,
            pivot,
            r1: 2.0 * pivot - low,
            s1: 2.0 * pivot - high,
            r2: pivot + range,
            s2: pivot - range,
            r3: high + 2.0 * (pivot - low),
            s3: low - 2.0 * (high - pivot),
        },
        PivotMethod::Fibonacci => {
            let [f1, f2, f3] = FIBONACCI_FACTORS;
            PivotLevels {
                method,
                date: bar.date,
                pivot,
                r1: pivot + f1 * range,
                r2: pivot + f2 * range,
                r3: pivot + f3 * range,
                s1: pivot - f1 * range,
                s2: pivot - f2 * range,
                s3: pivot - f3 * range,
            }
        }
    };

    if !levels.is_strictly_ordered() {
        return Err(PivotError::DegenerateRange { date: bar.date });
    }
    Ok(levels)
}

/// Pick the reference bar from `series` according to `rule`.
pub fn select_reference(series: &BarSeries, rule: ReferenceBar) -> Result<&PriceBar, PivotError> {
    let bars = series.bars();
    let bar = match rule {
        ReferenceBar::Latest => bars.last(),
        ReferenceBar::Previous => bars.len().checked_sub(2).map(|i| &bars[i]),
    };
    bar.ok_or(PivotError::NoReferenceBar {
        available: bars.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use midgrid_core::error::BarError;
    use proptest::prelude::*;

    fn bar(high: f64, low: f64, close: f64) -> PriceBar {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        PriceBar::new(date, close, high, low, close, 1_000)
    }

    #[test]
    fn test_classic_pivots() {
        let levels = compute(&bar(110.0, 90.0, 100.0)).unwrap();

        assert!((levels.pivot - 100.0).abs() < 1e-10);
        assert!((levels.r1 - 110.0).abs() < 1e-10);
        assert!((levels.s1 - 90.0).abs() < 1e-10);
        assert!((levels.r2 - 120.0).abs() < 1e-10);
        assert!((levels.s2 - 80.0).abs() < 1e-10);
        assert!((levels.r3 - 130.0).abs() < 1e-10);
        assert!((levels.s3 - 70.0).abs() < 1e-10);
    }

    #[test]
    fn test_fibonacci_pivots() {
        let levels = compute_with(&bar(110.0, 90.0, 100.0), PivotMethod::Fibonacci).unwrap();

        assert!((levels.r1 - 107.64).abs() < 1e-10);
        assert!((levels.s2 - 87.64).abs() < 1e-10);
        assert!((levels.r3 - 120.0).abs() < 1e-10);
        assert!(levels.is_strictly_ordered());
    }

    #[test]
    fn test_invalid_bar_rejected() {
        let err = compute(&bar(90.0, 110.0, 100.0)).unwrap_err();
        assert!(matches!(err, PivotError::InvalidBar(BarError::InvalidBar { .. })));
    }

    #[test]
    fn test_zero_range_rejected() {
        let err = compute(&bar(100.0, 100.0, 100.0)).unwrap_err();
        assert!(matches!(err, PivotError::DegenerateRange { .. }));
    }

    #[test]
    fn test_select_reference() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
        let series = BarSeries::new(
            "TEST",
            vec![
                PriceBar::new(d(3), 10.0, 11.0, 9.0, 10.0, 1),
                PriceBar::new(d(4), 10.0, 12.0, 9.5, 11.0, 1),
            ],
        )
        .unwrap();

        assert_eq!(select_reference(&series, ReferenceBar::Previous).unwrap().date, d(3));
        assert_eq!(select_reference(&series, ReferenceBar::Latest).unwrap().date, d(4));

        let short = BarSeries::new("TEST", vec![series.bars()[0]]).unwrap();
        assert_eq!(
            select_reference(&short, ReferenceBar::Previous),
            Err(PivotError::NoReferenceBar { available: 1 })
        );
    }

    #[test]
    fn test_labels_serialize_lowercase() {
        let json = serde_json::to_string(&PivotLabel::R2).unwrap();
        assert_eq!(json, "\"r2\"");
        assert_eq!(PivotLabel::Pivot.to_string(), "P");
    }

    proptest! {
        #[test]
        fn prop_levels_strictly_ordered(
            low in 1.0f64..10_000.0,
            spread in 0.001f64..0.5,
            close_pos in 0.0f64..=1.0,
            fib in any::<bool>(),
        ) {
            let high = low * (1.0 + spread);
            let close = (low + (high - low) * close_pos).clamp(low, high);
            let method = if fib { PivotMethod::Fibonacci } else { PivotMethod::Classic };
            let levels = compute_with(&bar(high, low, close), method).unwrap();

            prop_assert!(levels.s3 < levels.s2);
            prop_assert!(levels.s2 < levels.s1);
            prop_assert!(levels.s1 < levels.pivot);
            prop_assert!(levels.pivot < levels.r1);
            prop_assert!(levels.r1 < levels.r2);
            prop_assert!(levels.r2 < levels.r3);
        }
    }
}
