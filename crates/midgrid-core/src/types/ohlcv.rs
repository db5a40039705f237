//! OHLCV price bars and the validated bar series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{BarError, DataError};

/// One trading period's prices.
///
/// Fields are public for cheap read access; use [`PriceBar::validate`] (or
/// build a [`BarSeries`] through [`BarSeries::new`] / [`BarSeries::ingest`])
/// to enforce `low <= min(open, close) <= max(open, close) <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading date
    pub date: NaiveDate,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Traded volume
    pub volume: u64,
}

impl PriceBar {
    /// Create a new bar. No validation is performed.
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Mid-price, `(high + low) / 2`.
    #[inline]
    pub fn mid_price(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Calculate the typical price (HLC average).
    #[inline]
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Calculate the bar's range (high - low).
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Check if the bar is bullish (close > open).
    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Whether `price` was traded during the bar (`low <= price <= high`).
    #[inline]
    pub fn contains(&self, price: f64) -> bool {
        self.low <= price && price <= self.high
    }

    /// Calculate the true range (used for ATR).
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            Some(pc) => {
                let hl = self.high - self.low;
                let hc = (self.high - pc).abs();
                let lc = (self.low - pc).abs();
                hl.max(hc).max(lc)
            }
            None => self.high - self.low,
        }
    }

    /// Check the price invariant.
    pub fn validate(&self) -> Result<(), BarError> {
        let invalid = |reason: String| BarError::InvalidBar {
            date: self.date,
            reason,
        };

        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(invalid("prices must be finite".to_string()));
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Err(invalid("prices must be positive".to_string()));
        }

        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if self.low > body_low {
            return Err(invalid(format!(
                "low {} is above open/close {}",
                self.low, body_low
            )));
        }
        if self.high < body_high {
            return Err(invalid(format!(
                "high {} is below open/close {}",
                self.high, body_high
            )));
        }
        Ok(())
    }
}

/// Unvalidated bar tuple as delivered by a market-data client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl TryFrom<RawBar> for PriceBar {
    type Error = BarError;

    fn try_from(raw: RawBar) -> Result<Self, Self::Error> {
        if !raw.volume.is_finite() || raw.volume < 0.0 || raw.volume.fract() != 0.0 {
            return Err(BarError::InvalidBar {
                date: raw.date,
                reason: format!("volume {} is not a non-negative integer", raw.volume),
            });
        }
        let bar = PriceBar::new(
            raw.date,
            raw.open,
            raw.high,
            raw.low,
            raw.close,
            raw.volume as u64,
        );
        bar.validate()?;
        Ok(bar)
    }
}

/// Bars of one instrument ordered by strictly increasing date.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    /// Symbol identifier
    pub symbol: String,
    bars: Vec<PriceBar>,
}

impl BarSeries {
    /// Build a series from bars already in date order.
    ///
    /// Every bar is validated and dates must be strictly increasing.
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, BarError> {
        for (index, bar) in bars.iter().enumerate() {
            bar.validate()?;
            if index > 0 {
                let previous = bars[index - 1].date;
                if bar.date <= previous {
                    return Err(BarError::OutOfOrder {
                        index,
                        date: bar.date,
                        previous,
                    });
                }
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Ingestion boundary for raw market-data tuples.
    ///
    /// Tuples are sorted by date, then each is validated. Invalid tuples and
    /// duplicate dates reject the whole batch.
    pub fn ingest(symbol: impl Into<String>, mut raws: Vec<RawBar>) -> Result<Self, DataError> {
        raws.sort_by_key(|r| r.date);

        let mut bars: Vec<PriceBar> = Vec::with_capacity(raws.len());
        for (index, raw) in raws.into_iter().enumerate() {
            let bar = PriceBar::try_from(raw)
                .map_err(|source| DataError::Rejected { index, source })?;
            if bars.last().is_some_and(|prev| prev.date == bar.date) {
                return Err(DataError::DuplicateDate(bar.date));
            }
            bars.push(bar);
        }

        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Create an empty series.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    /// Append a bar, enforcing validity and date order.
    pub fn push(&mut self, bar: PriceBar) -> Result<(), BarError> {
        bar.validate()?;
        if let Some(prev) = self.bars.last() {
            if bar.date <= prev.date {
                return Err(BarError::OutOfOrder {
                    index: self.bars.len(),
                    date: bar.date,
                    previous: prev.date,
                });
            }
        }
        self.bars.push(bar);
        Ok(())
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get all bars as a slice.
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Get the last N bars.
    pub fn last_n(&self, n: usize) -> &[PriceBar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    /// Get the first bar.
    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    /// Get the last bar.
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Get a bar by index (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    /// Bars dated within `[start, end]`, as a new series.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> BarSeries {
        Self {
            symbol: self.symbol.clone(),
            bars: self
                .bars
                .iter()
                .filter(|b| b.date >= start && b.date <= end)
                .copied()
                .collect(),
        }
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Extract high prices as a vector.
    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    /// Extract low prices as a vector.
    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// Extract mid-prices as a vector.
    pub fn mid_prices(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.mid_price()).collect()
    }

    /// Get an iterator over the bars.
    pub fn iter(&self) -> impl Iterator<Item = &PriceBar> {
        self.bars.iter()
    }
}

/// Collects bars without validation.
///
/// Meant for tests and trusted in-memory sources; downstream components
/// still re-check bars where a bad one would corrupt their output.
impl FromIterator<PriceBar> for BarSeries {
    fn from_iter<T: IntoIterator<Item = PriceBar>>(iter: T) -> Self {
        Self {
            symbol: String::new(),
            bars: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_bar_calculations() {
        let bar = PriceBar::new(day(2), 100.0, 110.0, 95.0, 105.0, 1_000_000);

        assert!((bar.mid_price() - 102.5).abs() < 1e-9);
        assert!((bar.typical_price() - 103.333333).abs() < 0.001);
        assert!((bar.range() - 15.0).abs() < 1e-9);
        assert!(bar.is_bullish());
        assert!(bar.contains(95.0));
        assert!(bar.contains(110.0));
        assert!(!bar.contains(110.01));
    }

    #[test]
    fn test_bar_true_range() {
        let bar = PriceBar::new(day(2), 100.0, 110.0, 95.0, 105.0, 1_000_000);

        assert!((bar.true_range(None) - 15.0).abs() < 0.001);
        // Gap from previous close widens the range
        assert!((bar.true_range(Some(90.0)) - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_validate_rejects_broken_invariant() {
        let high_below_close = PriceBar::new(day(2), 100.0, 101.0, 99.0, 102.0, 10);
        assert!(high_below_close.validate().is_err());

        let low_above_open = PriceBar::new(day(2), 100.0, 105.0, 100.5, 101.0, 10);
        assert!(low_above_open.validate().is_err());

        let zero = PriceBar::new(day(2), 0.0, 0.0, 0.0, 0.0, 10);
        assert!(zero.validate().is_err());

        let nan = PriceBar::new(day(2), f64::NAN, 1.0, 1.0, 1.0, 10);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_series_rejects_out_of_order() {
        let bars = vec![
            PriceBar::new(day(3), 10.0, 11.0, 9.0, 10.0, 1),
            PriceBar::new(day(2), 10.0, 11.0, 9.0, 10.0, 1),
        ];
        let err = BarSeries::new("TEST", bars).unwrap_err();
        assert!(matches!(err, BarError::OutOfOrder { index: 1, .. }));
    }

    #[test]
    fn test_ingest_sorts_and_rejects() {
        let raw = |d: u32, high: f64| RawBar {
            date: day(d),
            open: 10.0,
            high,
            low: 9.0,
            close: 10.0,
            volume: 100.0,
        };

        let series = BarSeries::ingest("TEST", vec![raw(3, 11.0), raw(2, 11.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().date, day(2));

        let err = BarSeries::ingest("TEST", vec![raw(2, 11.0), raw(3, 8.0)]).unwrap_err();
        assert!(matches!(err, DataError::Rejected { index: 1, .. }));

        let err = BarSeries::ingest("TEST", vec![raw(2, 11.0), raw(2, 12.0)]).unwrap_err();
        assert!(matches!(err, DataError::DuplicateDate(d) if d == day(2)));

        let mut fractional = raw(4, 11.0);
        fractional.volume = 1.5;
        assert!(BarSeries::ingest("TEST", vec![fractional]).is_err());
    }

    #[test]
    fn test_push_and_slices() {
        let mut series = BarSeries::empty("TEST");
        series.push(PriceBar::new(day(1), 100.0, 101.0, 99.0, 100.5, 1000)).unwrap();
        series.push(PriceBar::new(day(2), 100.5, 102.0, 100.0, 101.5, 2000)).unwrap();
        assert!(series
            .push(PriceBar::new(day(2), 100.5, 102.0, 100.0, 101.5, 2000))
            .is_err());

        assert_eq!(series.closes(), vec![100.5, 101.5]);
        assert_eq!(series.mid_prices(), vec![100.0, 101.0]);
        assert_eq!(series.last_n(1)[0].date, day(2));
        assert_eq!(series.last_n(10).len(), 2);
        assert_eq!(series.between(day(2), day(9)).len(), 1);
    }

    proptest! {
        #[test]
        fn prop_raw_bars_within_invariant_are_accepted(
            low in 1.0f64..1000.0,
            spread in 0.0f64..100.0,
            o in 0.0f64..=1.0,
            c in 0.0f64..=1.0,
            volume in 0u32..1_000_000,
        ) {
            let high = low + spread;
            let raw = RawBar {
                date: day(5),
                open: low + spread * o,
                high,
                low,
                close: low + spread * c,
                volume: volume as f64,
            };
            let bar = PriceBar::try_from(raw);
            prop_assert!(bar.is_ok());
        }
    }
}
