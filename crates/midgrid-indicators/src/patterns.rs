//! Bar patterns: contraction stars and range breakouts.

use serde::{Deserialize, Serialize};
use midgrid_core::types::PriceBar;

/// Color of a contraction star, from the mid-price drift across its bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StarColor {
    /// Mid-price rose on each bar
    Red,
    /// Mid-price fell on each bar
    Green,
    /// Mixed or flat
    Yellow,
}

/// Direction of a breakout from the trailing range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakout {
    Up,
    Down,
}

/// Mark three-bar contractions.
///
/// A star is placed on the third bar when amplitude strictly shrank over
/// the three bars and bars two and three traded inside bar one's range.
/// Bars with no amplitude (degenerate) never take part in a star.
pub fn detect_stars(bars: &[PriceBar], amplitudes: &[Option<f64>]) -> Vec<Option<StarColor>> {
    let mut stars = vec![None; bars.len()];

    for i in 2..bars.len() {
        let (Some(a1), Some(a2), Some(a3)) = (amplitudes[i - 2], amplitudes[i - 1], amplitudes[i])
        else {
            continue;
        };
        if !(a1 > a2 && a2 > a3) {
            continue;
        }

        let first = &bars[i - 2];
        let inside = |bar: &PriceBar| first.contains(bar.low) && first.contains(bar.high);
        if !(inside(&bars[i - 1]) && inside(&bars[i])) {
            continue;
        }

        let (m1, m2, m3) = (
            first.mid_price(),
            bars[i - 1].mid_price(),
            bars[i].mid_price(),
        );
        stars[i] = Some(if m1 < m2 && m2 < m3 {
            StarColor::Red
        } else if m1 > m2 && m2 > m3 {
            StarColor::Green
        } else {
            StarColor::Yellow
        });
    }

    stars
}

/// Flag closes that escape the prior `window` bars' range by `threshold`.
pub fn detect_breakouts(bars: &[PriceBar], window: usize, threshold: f64) -> Vec<Option<Breakout>> {
    let mut flags = vec![None; bars.len()];
    if window == 0 {
        return flags;
    }

    for i in window..bars.len() {
        let prior = &bars[i - window..i];
        let hist_high = prior.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let hist_low = prior.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let close = bars[i].close;

        if close > hist_high * (1.0 + threshold) {
            flags[i] = Some(Breakout::Up);
        } else if close < hist_low * (1.0 - threshold) {
            flags[i] = Some(Breakout::Down);
        }
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, high: f64, low: f64, close: f64) -> PriceBar {
        let date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        PriceBar::new(date, close, high, low, close, 100)
    }

    fn amplitudes(bars: &[PriceBar]) -> Vec<Option<f64>> {
        bars.iter().map(|b| Some(b.range() / b.mid_price())).collect()
    }

    #[test]
    fn test_star_rising_mid_is_red() {
        let bars = vec![
            bar(1, 20.0, 10.0, 15.0),
            bar(2, 19.0, 12.0, 15.0),
            bar(3, 18.5, 14.0, 16.0),
        ];
        let stars = detect_stars(&bars, &amplitudes(&bars));
        assert_eq!(stars, vec![None, None, Some(StarColor::Red)]);
    }

    #[test]
    fn test_star_requires_inside_bars() {
        let bars = vec![
            bar(1, 20.0, 10.0, 15.0),
            bar(2, 21.0, 16.0, 18.0),
            bar(3, 20.5, 18.0, 19.0),
        ];
        let stars = detect_stars(&bars, &amplitudes(&bars));
        assert!(stars.iter().all(Option::is_none));
    }

    #[test]
    fn test_star_skips_degenerate_amplitude() {
        let bars = vec![
            bar(1, 20.0, 10.0, 15.0),
            bar(2, 19.0, 12.0, 15.0),
            bar(3, 18.5, 14.0, 16.0),
        ];
        let mut amps = amplitudes(&bars);
        amps[1] = None;
        assert!(detect_stars(&bars, &amps).iter().all(Option::is_none));
    }

    #[test]
    fn test_breakouts() {
        let mut bars: Vec<PriceBar> = (1..=5).map(|d| bar(d, 11.0, 9.0, 10.0)).collect();
        bars.push(bar(6, 12.0, 10.0, 11.5));
        bars.push(bar(7, 10.0, 8.0, 8.5));

        let flags = detect_breakouts(&bars, 5, 0.02);
        assert_eq!(flags[5], Some(Breakout::Up));
        // 8.5 < 9 * 0.98 = 8.82
        assert_eq!(flags[6], Some(Breakout::Down));
        assert!(flags[..5].iter().all(Option::is_none));
    }
}
