//! Per-bar indicator derivation over a bar series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use midgrid_core::error::IndicatorError;
use midgrid_core::traits::Indicator;
use midgrid_core::types::{BarSeries, PriceBar};

use crate::amplitude::{PercentileBands, TrailingRank, TrailingStats};
use crate::momentum::{Mpmi, MpmiCross, MpmiPoint};
use crate::moving_average::{RollingSum, Sma};
use crate::volatility::Atr;
use crate::patterns::{detect_breakouts, detect_stars, Breakout, StarColor};

/// Default rolling window.
pub const DEFAULT_WINDOW: usize = 10;

/// A rolling aggregate that may not be computable yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Rolling<T> {
    /// Enough history has accumulated
    Ready { value: T },
    /// Not enough contiguous history
    Unavailable { required: usize, available: usize },
    /// History is present but the statistic has no defined value
    Undefined,
}

impl<T: Copy> Rolling<T> {
    /// The value if ready.
    pub fn value(&self) -> Option<T> {
        match self {
            Rolling::Ready { value } => Some(*value),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Rolling::Ready { .. })
    }

    /// The value, or `InsufficientData` when history is short.
    pub fn require(&self) -> Result<Option<T>, IndicatorError> {
        match *self {
            Rolling::Ready { value } => Ok(Some(value)),
            Rolling::Unavailable {
                required,
                available,
            } => Err(IndicatorError::InsufficientData {
                required,
                available,
            }),
            Rolling::Undefined => Ok(None),
        }
    }

    fn from_output(value: Option<T>, required: usize, available: usize) -> Self {
        match value {
            Some(value) => Rolling::Ready { value },
            None => Rolling::Unavailable {
                required,
                available,
            },
        }
    }
}

/// Indicator values derived from one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub index: usize,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// `(high + low) / 2`
    pub mid_price: f64,
    /// `(high - low) / mid_price`
    pub amplitude: f64,
    /// `(mid_price - open) / mid_price`
    pub open_mid_diff: f64,
    /// Mean `open_mid_diff` over the window, current bar included
    pub open_mid_diff_avg: Rolling<f64>,
    /// Sum of `open_mid_diff` over the window, current bar included
    pub open_mid_diff_sum: Rolling<f64>,
    pub open_mid_diff_percentile: Rolling<f64>,
    pub open_mid_diff_zscore: Rolling<f64>,
    pub open_mid_diff_bands: Rolling<PercentileBands>,
    /// `(high - low) / previous close`
    pub rel_amplitude: Rolling<f64>,
    pub mid_upper: f64,
    pub mid_lower: f64,
    /// Mean amplitude over the window, current bar included
    pub avg_amplitude: Rolling<f64>,
    pub atr: Rolling<f64>,
    /// Percent change of ATR from the previous bar
    pub atr_change: Rolling<f64>,
    /// Share of prior amplitudes below this one, 0-100
    pub amplitude_percentile: Rolling<f64>,
    pub amplitude_zscore: Rolling<f64>,
    /// p20/p50/p80 of the prior amplitudes
    pub amplitude_bands: Rolling<PercentileBands>,
    pub mpmi: Rolling<MpmiPoint>,
    /// Line crossing its signal on this bar
    pub mpmi_cross: Option<MpmiCross>,
    pub star: Option<StarColor>,
    pub breakout: Option<Breakout>,
}

/// Indicator engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    /// Window for average amplitude, ATR and the open/mid aggregates
    pub window: usize,
    /// Number of prior bars ranked against
    pub percentile_window: usize,
    /// Half-width of the mid-price channel, as a fraction
    pub band_pct: f64,
    pub breakout_window: usize,
    pub breakout_threshold: f64,
    pub mpmi_fast: usize,
    pub mpmi_slow: usize,
    pub mpmi_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            percentile_window: 20,
            band_pct: 0.01,
            breakout_window: 5,
            breakout_threshold: 0.02,
            mpmi_fast: 12,
            mpmi_slow: 26,
            mpmi_signal: 9,
        }
    }
}

impl IndicatorParams {
    /// Default parameters with a specific rolling window.
    pub fn with_window(window: usize) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), IndicatorError> {
        let invalid = |msg: String| Err(IndicatorError::InvalidParameter(msg));

        if self.window == 0 {
            return invalid("window must be positive".to_string());
        }
        if self.percentile_window < 2 {
            return invalid(format!(
                "percentile_window must be at least 2, got {}",
                self.percentile_window
            ));
        }
        if !(0.0..1.0).contains(&self.band_pct) {
            return invalid(format!("band_pct must be in [0, 1), got {}", self.band_pct));
        }
        if self.breakout_window == 0 {
            return invalid("breakout_window must be positive".to_string());
        }
        if !(self.breakout_threshold >= 0.0 && self.breakout_threshold.is_finite()) {
            return invalid(format!(
                "breakout_threshold must be non-negative, got {}",
                self.breakout_threshold
            ));
        }
        if self.mpmi_fast == 0 || self.mpmi_signal == 0 || self.mpmi_fast >= self.mpmi_slow {
            return invalid(format!(
                "MPMI periods must satisfy 0 < fast < slow and signal > 0, got ({}, {}, {})",
                self.mpmi_fast, self.mpmi_slow, self.mpmi_signal
            ));
        }
        Ok(())
    }
}

/// Derives [`IndicatorRow`]s from a [`BarSeries`].
///
/// Stateless between calls: the same series always yields the same rows.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    params: IndicatorParams,
}

impl IndicatorEngine {
    pub fn new(params: IndicatorParams) -> Result<Self, IndicatorError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// One row per bar, failing on the first degenerate bar.
    pub fn compute(&self, series: &BarSeries) -> Result<Vec<IndicatorRow>, IndicatorError> {
        self.compute_each(series)?.into_iter().collect()
    }

    /// One result per bar. Degenerate bars are flagged individually and
    /// break the rolling history around them.
    pub fn compute_each(
        &self,
        series: &BarSeries,
    ) -> Result<Vec<Result<IndicatorRow, IndicatorError>>, IndicatorError> {
        self.params.validate()?;
        let p = &self.params;
        let bars = series.bars();

        let valid: Vec<bool> = bars.iter().map(is_usable).collect();
        let mids: Vec<Option<f64>> = masked(bars, &valid, |_, b| b.mid_price());
        let amplitudes: Vec<Option<f64>> =
            masked(bars, &valid, |_, b| b.range() / b.mid_price());
        let open_mid: Vec<Option<f64>> = masked(bars, &valid, |_, b| open_mid_diff(b));
        let true_ranges = Atr::true_ranges_masked(bars, &valid);
        let runs = run_lengths(&valid);

        let sma = Sma::new(p.window);
        let sum = RollingSum::new(p.window);
        let atr_indicator = Atr::new(p.window);
        let rank = TrailingRank::new(p.percentile_window);
        let mpmi = Mpmi::with_periods(p.mpmi_fast, p.mpmi_slow, p.mpmi_signal);

        let avg_amplitude = per_run(&sma, &amplitudes);
        let atr = per_run(&atr_indicator, &true_ranges);
        let ranks = per_run(&rank, &amplitudes);
        let open_mid_avg = per_run(&sma, &open_mid);
        let open_mid_sum = per_run(&sum, &open_mid);
        let open_mid_ranks = per_run(&rank, &open_mid);
        let momentum = per_run(&mpmi, &mids);
        let stars = detect_stars(bars, &amplitudes);
        let breakouts = detect_breakouts(bars, p.breakout_window, p.breakout_threshold);

        let rows: Vec<Result<IndicatorRow, IndicatorError>> = bars
            .iter()
            .enumerate()
            .map(|(index, bar)| {
                if !valid[index] {
                    return Err(IndicatorError::DegenerateBar {
                        date: bar.date,
                        index,
                    });
                }

                let mid = bar.mid_price();
                let available = runs[index];
                let rel_amplitude = match index.checked_sub(1).map(|i| bars[i].close) {
                    Some(prev) if available > 1 && prev > 0.0 => Rolling::Ready {
                        value: bar.range() / prev,
                    },
                    _ => Rolling::Unavailable {
                        required: 2,
                        available,
                    },
                };
                let (amplitude_percentile, amplitude_zscore, amplitude_bands) =
                    ranked(ranks[index], rank.period(), available);
                let (open_mid_diff_percentile, open_mid_diff_zscore, open_mid_diff_bands) =
                    ranked(open_mid_ranks[index], rank.period(), available);

                // Both ATRs come from the same run, so a ready pair is contiguous
                let previous = index.checked_sub(1);
                let atr_change = match (previous.and_then(|i| atr[i]), atr[index]) {
                    (Some(prev), Some(current)) if prev != 0.0 => Rolling::Ready {
                        value: (current - prev) / prev * 100.0,
                    },
                    (Some(_), Some(_)) => Rolling::Undefined,
                    _ => Rolling::Unavailable {
                        required: atr_indicator.period() + 1,
                        available,
                    },
                };
                let mpmi_cross = match (previous.and_then(|i| momentum[i]), momentum[index]) {
                    (Some(prev), Some(current)) => MpmiCross::between(&prev, &current),
                    _ => None,
                };

                Ok(IndicatorRow {
                    index,
                    date: bar.date,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                    mid_price: mid,
                    amplitude: bar.range() / mid,
                    open_mid_diff: open_mid_diff(bar),
                    open_mid_diff_avg: Rolling::from_output(
                        open_mid_avg[index],
                        sma.period(),
                        available,
                    ),
                    open_mid_diff_sum: Rolling::from_output(
                        open_mid_sum[index],
                        sum.period(),
                        available,
                    ),
                    open_mid_diff_percentile,
                    open_mid_diff_zscore,
                    open_mid_diff_bands,
                    rel_amplitude,
                    mid_upper: mid * (1.0 + p.band_pct),
                    mid_lower: mid * (1.0 - p.band_pct),
                    avg_amplitude: Rolling::from_output(
                        avg_amplitude[index],
                        sma.period(),
                        available,
                    ),
                    atr: Rolling::from_output(atr[index], atr_indicator.period(), available),
                    atr_change,
                    amplitude_percentile,
                    amplitude_zscore,
                    amplitude_bands,
                    mpmi: Rolling::from_output(momentum[index], mpmi.period(), available),
                    mpmi_cross,
                    star: stars[index],
                    breakout: breakouts[index],
                })
            })
            .collect();

        debug!(
            symbol = %series.symbol,
            bars = bars.len(),
            degenerate = valid.iter().filter(|v| !**v).count(),
            window = p.window,
            "Computed indicator rows"
        );

        Ok(rows)
    }
}

/// Compute indicator rows with default parameters and an optional window.
///
/// `window` defaults to [`DEFAULT_WINDOW`] and must be positive.
pub fn compute(
    series: &BarSeries,
    window: Option<usize>,
) -> Result<Vec<IndicatorRow>, IndicatorError> {
    let params = IndicatorParams::with_window(window.unwrap_or(DEFAULT_WINDOW));
    IndicatorEngine::new(params)?.compute(series)
}

fn open_mid_diff(bar: &PriceBar) -> f64 {
    let mid = bar.mid_price();
    (mid - bar.open) / mid
}

/// Percentile, z-score and bands of one trailing rank output.
fn ranked(
    stats: Option<TrailingStats>,
    required: usize,
    available: usize,
) -> (Rolling<f64>, Rolling<f64>, Rolling<PercentileBands>) {
    match stats {
        Some(stats) => (
            Rolling::Ready {
                value: stats.percentile,
            },
            stats
                .zscore
                .map_or(Rolling::Undefined, |value| Rolling::Ready { value }),
            Rolling::Ready { value: stats.bands },
        ),
        None => (
            Rolling::Unavailable {
                required,
                available,
            },
            Rolling::Unavailable {
                required,
                available,
            },
            Rolling::Unavailable {
                required,
                available,
            },
        ),
    }
}

fn is_usable(bar: &PriceBar) -> bool {
    let mid = bar.mid_price();
    mid.is_finite() && mid > 0.0
}

fn masked(
    bars: &[PriceBar],
    valid: &[bool],
    f: impl Fn(usize, &PriceBar) -> f64,
) -> Vec<Option<f64>> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| valid[i].then(|| f(i, bar)))
        .collect()
}

/// Length of the valid run ending at each index (0 on invalid entries).
fn run_lengths(valid: &[bool]) -> Vec<usize> {
    let mut run = 0;
    valid
        .iter()
        .map(|&ok| {
            run = if ok { run + 1 } else { 0 };
            run
        })
        .collect()
}

/// Apply `indicator` separately to each contiguous run of present values,
/// aligned to the input.
fn per_run<I: Indicator>(indicator: &I, values: &[Option<f64>]) -> Vec<Option<I::Output>> {
    let mut out = Vec::with_capacity(values.len());
    let mut start = 0;

    while start < values.len() {
        if values[start].is_none() {
            out.push(None);
            start += 1;
            continue;
        }
        let end = values[start..]
            .iter()
            .position(Option::is_none)
            .map_or(values.len(), |offset| start + offset);
        let run: Vec<f64> = values[start..end].iter().flatten().copied().collect();
        out.extend(indicator.calculate_aligned(&run));
        start = end;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(offset)
    }

    fn series_of(bars: Vec<PriceBar>) -> BarSeries {
        BarSeries::new("TEST", bars).unwrap()
    }

    fn flat_bars(n: usize) -> Vec<PriceBar> {
        (0..n)
            .map(|i| PriceBar::new(date(i as u64), 7.0, 10.0, 5.0, 8.0, 1_000))
            .collect()
    }

    #[test]
    fn test_mid_price_and_amplitude() {
        let rows = compute(&series_of(flat_bars(5)), None).unwrap();

        assert_eq!(rows.len(), 5);
        for row in &rows {
            assert!((row.mid_price - 7.5).abs() < 1e-12);
            assert!((row.amplitude - 0.6667).abs() < 1e-4);
        }
    }

    #[test]
    fn test_rolling_unavailable_before_window() {
        let rows = compute(&series_of(flat_bars(5)), Some(3)).unwrap();

        assert_eq!(
            rows[1].avg_amplitude,
            Rolling::Unavailable {
                required: 3,
                available: 2
            }
        );
        let avg = rows[2].avg_amplitude.value().unwrap();
        assert!((avg - 5.0 / 7.5).abs() < 1e-12);
        assert!(rows[4].atr.is_ready());
    }

    #[test]
    fn test_rel_amplitude_needs_previous_close() {
        let rows = compute(&series_of(flat_bars(2)), None).unwrap();

        assert!(!rows[0].rel_amplitude.is_ready());
        let rel = rows[1].rel_amplitude.value().unwrap();
        assert!((rel - 5.0 / 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_mid_channel_and_open_diff() {
        let rows = compute(&series_of(flat_bars(1)), None).unwrap();
        let row = &rows[0];

        assert!((row.mid_upper - 7.575).abs() < 1e-12);
        assert!((row.mid_lower - 7.425).abs() < 1e-12);
        assert!((row.open_mid_diff - 0.5 / 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_flat_history_zscore_undefined() {
        let params = IndicatorParams {
            percentile_window: 3,
            ..IndicatorParams::default()
        };
        let engine = IndicatorEngine::new(params).unwrap();
        let rows = engine.compute(&series_of(flat_bars(4))).unwrap();

        assert!(!rows[2].amplitude_percentile.is_ready());
        assert_eq!(rows[3].amplitude_zscore, Rolling::Undefined);
        assert_eq!(rows[3].amplitude_percentile.value(), Some(0.0));
    }

    #[test]
    fn test_degenerate_bar_names_date() {
        let mut bars = flat_bars(3);
        bars[1] = PriceBar::new(date(1), 0.0, 0.0, 0.0, 0.0, 0);
        let series: BarSeries = bars.into_iter().collect();

        let err = compute(&series, None).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::DegenerateBar {
                date: date(1),
                index: 1
            }
        );
        assert!(err.to_string().contains("2024-01-02"));
    }

    #[test]
    fn test_compute_each_flags_single_row() {
        let mut bars = flat_bars(4);
        bars[1] = PriceBar::new(date(1), 0.0, 0.0, 0.0, 0.0, 0);
        let series: BarSeries = bars.into_iter().collect();

        let engine = IndicatorEngine::new(IndicatorParams::with_window(2)).unwrap();
        let rows = engine.compute_each(&series).unwrap();

        assert_eq!(rows.len(), 4);
        assert!(rows[0].is_ok());
        assert!(rows[1].is_err());
        // history restarts after the bad bar
        let row2 = rows[2].as_ref().unwrap();
        assert!(!row2.avg_amplitude.is_ready());
        assert!(!row2.rel_amplitude.is_ready());
        assert!(rows[3].as_ref().unwrap().avg_amplitude.is_ready());
    }

    #[test]
    fn test_atr_restarts_after_degenerate_bar() {
        let mut bars = flat_bars(4);
        bars[1] = PriceBar::new(date(1), 0.0, 0.0, 0.0, 0.0, 0);
        bars[2] = PriceBar::new(date(2), 16.0, 20.0, 15.0, 18.0, 1_000);
        let series: BarSeries = bars.into_iter().collect();

        let engine = IndicatorEngine::new(IndicatorParams::with_window(2)).unwrap();
        let rows = engine.compute_each(&series).unwrap();

        let row2 = rows[2].as_ref().unwrap();
        assert_eq!(
            row2.atr,
            Rolling::Unavailable {
                required: 2,
                available: 1
            }
        );
        // TR 5 (no usable previous close) and TR 13 (gap down from 18)
        let atr = rows[3].as_ref().unwrap().atr.value().unwrap();
        assert!((atr - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_atr_matches_indicator_on_clean_series() {
        let bars: Vec<PriceBar> = (0..8)
            .map(|i| {
                let base = 50.0 + (i % 3) as f64 * 2.0;
                PriceBar::new(date(i), base, base + 1.5, base - 1.0, base + 0.5, 10)
            })
            .collect();
        let expected = Atr::new(3).calculate_bars(&bars);
        let rows = compute(&series_of(bars), Some(3)).unwrap();

        let atr: Vec<f64> = rows.iter().filter_map(|r| r.atr.value()).collect();
        assert_eq!(atr, expected);
    }

    #[test]
    fn test_atr_change_in_percent() {
        let bars: Vec<PriceBar> = [1.0, 1.0, 2.0]
            .iter()
            .enumerate()
            .map(|(i, &r)| PriceBar::new(date(i as u64), 100.0, 100.0 + r, 100.0 - r, 100.0, 10))
            .collect();
        let rows = compute(&series_of(bars), Some(2)).unwrap();

        assert_eq!(
            rows[1].atr_change,
            Rolling::Unavailable {
                required: 3,
                available: 2
            }
        );
        // ATR 2 -> 3
        let change = rows[2].atr_change.value().unwrap();
        assert!((change - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_open_mid_aggregates() {
        let bars: Vec<PriceBar> = [99.0, 100.0, 101.0]
            .iter()
            .enumerate()
            .map(|(i, &open)| PriceBar::new(date(i as u64), open, 101.0, 99.0, 100.0, 10))
            .collect();
        let params = IndicatorParams {
            window: 2,
            percentile_window: 2,
            ..IndicatorParams::default()
        };
        let rows = IndicatorEngine::new(params)
            .unwrap()
            .compute(&series_of(bars))
            .unwrap();

        // diffs 0.01, 0, -0.01
        assert!(!rows[0].open_mid_diff_avg.is_ready());
        assert!((rows[1].open_mid_diff_avg.value().unwrap() - 0.005).abs() < 1e-12);
        assert!((rows[2].open_mid_diff_sum.value().unwrap() + 0.01).abs() < 1e-12);

        assert_eq!(rows[2].open_mid_diff_percentile.value(), Some(0.0));
        let z = rows[2].open_mid_diff_zscore.value().unwrap();
        assert!((z + 0.015 / 0.00005f64.sqrt()).abs() < 1e-9);
        let bands = rows[2].open_mid_diff_bands.value().unwrap();
        assert!((bands.p50 - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_amplitude_bands_from_prior_window() {
        let params = IndicatorParams {
            percentile_window: 3,
            ..IndicatorParams::default()
        };
        let rows = IndicatorEngine::new(params)
            .unwrap()
            .compute(&series_of(flat_bars(4)))
            .unwrap();

        assert!(!rows[2].amplitude_bands.is_ready());
        let bands = rows[3].amplitude_bands.value().unwrap();
        assert!((bands.p20 - 5.0 / 7.5).abs() < 1e-12);
        assert!((bands.p80 - 5.0 / 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_mpmi_cross_flags() {
        // up for 20 bars, then down for 20
        let bars: Vec<PriceBar> = (0..40u64)
            .map(|i| {
                let base = if i < 20 { 100.0 + i as f64 } else { 139.0 - i as f64 };
                PriceBar::new(date(i), base, base + 1.0, base - 1.0, base, 10)
            })
            .collect();
        let params = IndicatorParams {
            mpmi_fast: 2,
            mpmi_slow: 3,
            mpmi_signal: 2,
            ..IndicatorParams::default()
        };
        let rows = IndicatorEngine::new(params)
            .unwrap()
            .compute(&series_of(bars))
            .unwrap();
        let warm = Mpmi::with_periods(2, 3, 2).period();

        assert_eq!(rows[warm - 1].mpmi_cross, None);
        for pair in rows[warm - 1..].windows(2) {
            let (prev, current) = (pair[0].mpmi.value().unwrap(), pair[1].mpmi.value().unwrap());
            assert_eq!(pair[1].mpmi_cross, MpmiCross::between(&prev, &current));
        }
        assert!(rows[20..]
            .iter()
            .any(|r| r.mpmi_cross == Some(MpmiCross::Death)));
    }

    #[test]
    fn test_zero_window_rejected() {
        let err = compute(&series_of(flat_bars(3)), Some(0)).unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidParameter(_)));
    }

    #[test]
    fn test_empty_series() {
        let rows = compute(&BarSeries::empty("TEST"), None).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_mpmi_warms_up() {
        let bars: Vec<PriceBar> = (0..40)
            .map(|i| {
                let base = 100.0 + i as f64;
                PriceBar::new(date(i), base, base + 1.0, base - 1.0, base, 10)
            })
            .collect();
        let rows = compute(&series_of(bars), None).unwrap();
        let warm = Mpmi::new().period();

        assert!(!rows[warm - 2].mpmi.is_ready());
        let point = rows[warm - 1].mpmi.value().unwrap();
        assert!(point.line > 0.0);
    }

    #[test]
    fn test_unavailable_require() {
        let missing: Rolling<f64> = Rolling::Unavailable {
            required: 10,
            available: 3,
        };
        assert_eq!(
            missing.require(),
            Err(IndicatorError::InsufficientData {
                required: 10,
                available: 3
            })
        );
    }

    #[test]
    fn test_deterministic() {
        let series = series_of(flat_bars(30));
        assert_eq!(compute(&series, None).unwrap(), compute(&series, None).unwrap());
    }

    proptest! {
        #[test]
        fn prop_one_row_per_bar(
            specs in prop::collection::vec((1.0f64..1000.0, 0.0f64..0.2, 0.0f64..1.0), 0..60),
            window in 1usize..15,
        ) {
            let bars: Vec<PriceBar> = specs
                .iter()
                .enumerate()
                .map(|(i, &(low, spread, pos))| {
                    let high = low * (1.0 + spread);
                    let close = low + (high - low) * pos;
                    PriceBar::new(date(i as u64), low, high, low, close, 1)
                })
                .collect();
            let series = series_of(bars);
            let rows = compute(&series, Some(window)).unwrap();

            prop_assert_eq!(rows.len(), series.len());
            for (row, bar) in rows.iter().zip(series.iter()) {
                prop_assert_eq!(row.date, bar.date);
            }
        }
    }
}
