//! Threshold alerts over the latest indicator row.
//!
//! Evaluation is pure: the same inputs always produce the same events, in
//! the order amplitude spike, level cross, threshold breach, range breakout.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use midgrid_core::MidgridError;
use midgrid_indicators::{Breakout, IndicatorRow};

use crate::grid::GridPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    AmplitudeSpike,
    LevelCross,
    ThresholdBreach,
    RangeBreakout,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertKind::AmplitudeSpike => "amplitude-spike",
            AlertKind::LevelCross => "level-cross",
            AlertKind::ThresholdBreach => "threshold-breach",
            AlertKind::RangeBreakout => "range-breakout",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Midnight UTC of the triggering row's date
    pub timestamp: DateTime<Utc>,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub triggering_value: f64,
    /// Grid level involved, for level crosses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_index: Option<usize>,
}

/// Alert thresholds. A `None` threshold disables its check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Alert when amplitude exceeds this multiple of the previous row's
    /// rolling average amplitude
    pub amplitude_spike_factor: Option<f64>,
    /// Tolerance around a grid level, as a fraction of the level price
    pub level_cross_tolerance: Option<f64>,
    /// Alert when mid-price leaves the grid bounds by this fraction
    pub breach_pct: Option<f64>,
    /// Alert on breakout flags
    pub breakout: bool,
}

impl AlertThresholds {
    pub fn validate(&self) -> Result<(), MidgridError> {
        let check = |name: &str, value: Option<f64>, positive: bool| match value {
            Some(v) if !v.is_finite() || v < 0.0 || (positive && v == 0.0) => {
                let bound = if positive { "positive" } else { "non-negative" };
                Err(MidgridError::Config(format!(
                    "alerts.{name} must be {bound}, got {v}"
                )))
            }
            _ => Ok(()),
        };
        check("amplitude_spike_factor", self.amplitude_spike_factor, true)?;
        check("level_cross_tolerance", self.level_cross_tolerance, false)?;
        check("breach_pct", self.breach_pct, false)?;
        Ok(())
    }

    pub fn any_enabled(&self) -> bool {
        self.amplitude_spike_factor.is_some()
            || self.level_cross_tolerance.is_some()
            || self.breach_pct.is_some()
            || self.breakout
    }
}

/// Evaluate `latest` against its history and an optional grid plan.
///
/// Only `history` rows dated before `latest` are consulted, so passing the
/// full row set (latest included) is fine.
pub fn evaluate(
    latest: &IndicatorRow,
    history: &[IndicatorRow],
    plan: Option<&GridPlan>,
    thresholds: &AlertThresholds,
) -> Vec<AlertEvent> {
    let timestamp = midnight_utc(latest.date);
    let prior: Vec<&IndicatorRow> = history.iter().filter(|r| r.date < latest.date).collect();
    let event = |kind: AlertKind,
                 severity: Severity,
                 message: String,
                 value: f64,
                 level_index: Option<usize>| AlertEvent {
        timestamp,
        kind,
        severity,
        message,
        triggering_value: value,
        level_index,
    };
    let mut events = Vec::new();

    // Baseline is the rolling average as of the previous row, which
    // excludes the latest amplitude.
    let baseline = prior.last().and_then(|r| r.avg_amplitude.value());
    if let (Some(factor), Some(average)) = (thresholds.amplitude_spike_factor, baseline) {
        if latest.amplitude > factor * average {
            events.push(event(
                AlertKind::AmplitudeSpike,
                Severity::Warning,
                format!(
                    "amplitude {:.4} exceeds {factor} x rolling average {:.4} on {}",
                    latest.amplitude, average, latest.date
                ),
                latest.amplitude,
                None,
            ));
        }
    }

    if let (Some(tolerance), Some(plan)) = (thresholds.level_cross_tolerance, plan) {
        let previous_mid = prior.last().map(|r| r.mid_price);
        let mid = latest.mid_price;
        for level in plan.levels() {
            let band = tolerance * level.price;
            let (low, high) = match previous_mid {
                Some(prev) => (prev.min(mid) - band, prev.max(mid) + band),
                None => (mid - band, mid + band),
            };
            if low <= level.price && level.price <= high {
                events.push(event(
                    AlertKind::LevelCross,
                    Severity::Info,
                    format!(
                        "mid-price {mid:.4} crossed {:?} level {} at {:.4}",
                        level.role, level.index, level.price
                    ),
                    mid,
                    Some(level.index),
                ));
            }
        }
    }

    if let (Some(pct), Some(plan)) = (thresholds.breach_pct, plan) {
        let mid = latest.mid_price;
        let ceiling = plan.upper_bound * (1.0 + pct);
        let floor = plan.lower_bound * (1.0 - pct);
        let breach = if mid > ceiling {
            Some(format!("mid-price {mid:.4} above grid ceiling {ceiling:.4}"))
        } else if mid < floor {
            Some(format!("mid-price {mid:.4} below grid floor {floor:.4}"))
        } else {
            None
        };
        if let Some(message) = breach {
            events.push(event(
                AlertKind::ThresholdBreach,
                Severity::Critical,
                message,
                mid,
                None,
            ));
        }
    }

    if thresholds.breakout {
        if let Some(direction) = latest.breakout {
            let word = match direction {
                Breakout::Up => "upward",
                Breakout::Down => "downward",
            };
            events.push(event(
                AlertKind::RangeBreakout,
                Severity::Warning,
                format!("close {:.4} broke {word} out of the recent range", latest.close),
                latest.close,
                None,
            ));
        }
    }

    events
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{build, SpacingMode};
    use midgrid_core::types::{BarSeries, PriceBar};

    fn rows(specs: &[(f64, f64)]) -> Vec<IndicatorRow> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let bars: Vec<PriceBar> = specs
            .iter()
            .enumerate()
            .map(|(i, &(high, low))| {
                let date = start + chrono::Days::new(i as u64);
                PriceBar::new(date, low, high, low, high, 100)
            })
            .collect();
        let series = BarSeries::new("TEST", bars).unwrap();
        midgrid_indicators::compute(&series, Some(3)).unwrap()
    }

    fn plan() -> GridPlan {
        build(90.0, 110.0, 5, SpacingMode::Uniform, None, 100.0).unwrap()
    }

    #[test]
    fn test_disabled_thresholds_emit_nothing() {
        let rows = rows(&[(101.0, 99.0), (140.0, 60.0)]);
        let events = evaluate(&rows[1], &rows, Some(&plan()), &AlertThresholds::default());
        assert!(events.is_empty());
    }

    #[test]
    fn test_amplitude_spike() {
        let rows = rows(&[(101.0, 99.0), (101.0, 99.0), (101.0, 99.0), (110.0, 90.0)]);
        let thresholds = AlertThresholds {
            amplitude_spike_factor: Some(3.0),
            ..Default::default()
        };
        let events = evaluate(&rows[3], &rows, None, &thresholds);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::AmplitudeSpike);
        assert!((events[0].triggering_value - 0.2).abs() < 1e-12);
        assert_eq!(events[0].timestamp.date_naive(), rows[3].date);

        // no history before the first row
        assert!(evaluate(&rows[0], &rows, None, &thresholds).is_empty());
        // the previous row's rolling average is not ready yet
        assert!(evaluate(&rows[2], &rows, None, &thresholds).is_empty());
    }

    #[test]
    fn test_spike_measured_against_rolling_average() {
        // A long calm stretch, then a wider regime the rolling window has caught up with
        let mut specs = vec![(101.0, 99.0); 30];
        specs.extend(vec![(105.0, 95.0); 5]);
        specs.push((112.5, 87.5));
        let calm = rows(&specs);
        let latest = calm.last().unwrap();
        let thresholds = AlertThresholds {
            amplitude_spike_factor: Some(3.0),
            ..Default::default()
        };

        assert!((latest.amplitude - 0.25).abs() < 1e-12);
        let baseline = calm[calm.len() - 2].avg_amplitude.value().unwrap();
        assert!((baseline - 0.10).abs() < 1e-12);
        // 0.25 is below 3 x 0.10 even though the all-history mean is far lower
        assert!(evaluate(latest, &calm, None, &thresholds).is_empty());

        *specs.last_mut().unwrap() = (116.0, 84.0);
        let wide = rows(&specs);
        let events = evaluate(wide.last().unwrap(), &wide, None, &thresholds);
        assert_eq!(events.len(), 1);
        assert!((events[0].triggering_value - 0.32).abs() < 1e-12);
    }

    #[test]
    fn test_level_cross_one_event_per_level() {
        // mids 96 -> 106 cross 100 and 105
        let rows = rows(&[(97.0, 95.0), (107.0, 105.0)]);
        let thresholds = AlertThresholds {
            level_cross_tolerance: Some(0.0),
            ..Default::default()
        };
        let events = evaluate(&rows[1], &rows, Some(&plan()), &thresholds);

        let indices: Vec<Option<usize>> = events.iter().map(|e| e.level_index).collect();
        assert_eq!(indices, vec![Some(2), Some(3)]);
        assert!(events.iter().all(|e| e.kind == AlertKind::LevelCross));
    }

    #[test]
    fn test_breach_and_order() {
        let rows = rows(&[(101.0, 99.0), (101.0, 99.0), (101.0, 99.0), (140.0, 120.0)]);
        let thresholds = AlertThresholds {
            amplitude_spike_factor: Some(2.0),
            level_cross_tolerance: Some(0.001),
            breach_pct: Some(0.05),
            breakout: true,
        };
        let events = evaluate(&rows[3], &rows, Some(&plan()), &thresholds);
        let kinds: Vec<AlertKind> = events.iter().map(|e| e.kind).collect();

        // mid 100 -> 130 crosses 100, 105, 110
        assert_eq!(
            kinds,
            vec![
                AlertKind::AmplitudeSpike,
                AlertKind::LevelCross,
                AlertKind::LevelCross,
                AlertKind::LevelCross,
                AlertKind::ThresholdBreach,
            ]
        );
        let breach = &events[4];
        assert_eq!(breach.severity, Severity::Critical);
        assert!((breach.triggering_value - 130.0).abs() < 1e-12);

        // idempotent
        assert_eq!(events, evaluate(&rows[3], &rows, Some(&plan()), &thresholds));
    }

    #[test]
    fn test_range_breakout() {
        let mut specs = vec![(101.0, 99.0); 5];
        specs.push((110.0, 104.0));
        let rows = rows(&specs);
        let thresholds = AlertThresholds {
            breakout: true,
            ..Default::default()
        };
        let events = evaluate(&rows[5], &rows, None, &thresholds);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::RangeBreakout);
    }

    #[test]
    fn test_validate() {
        let bad = AlertThresholds {
            amplitude_spike_factor: Some(0.0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        assert!(AlertThresholds::default().validate().is_ok());
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&AlertKind::ThresholdBreach).unwrap();
        assert_eq!(json, "\"threshold-breach\"");
    }
}
