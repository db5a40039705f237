//! Point-in-time snapshot of an analysis, for handing to text consumers.

use std::fmt::Write;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use midgrid_indicators::{IndicatorRow, Rolling};
use midgrid_strategy::{AlertEvent, GridPlan, LevelRole, PivotLevels};

/// Latest indicator rows with the pivots, grid and alerts derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub symbol: String,
    /// Date of the newest row
    pub as_of: Option<NaiveDate>,
    pub rows: Vec<IndicatorRow>,
    pub pivots: Option<PivotLevels>,
    pub plan: Option<GridPlan>,
    pub alerts: Vec<AlertEvent>,
}

impl Snapshot {
    /// Keep the last `last_n` of `rows`.
    pub fn new(
        symbol: impl Into<String>,
        rows: &[IndicatorRow],
        last_n: usize,
        pivots: Option<PivotLevels>,
        plan: Option<GridPlan>,
        alerts: Vec<AlertEvent>,
    ) -> Self {
        let start = rows.len().saturating_sub(last_n);
        let rows = rows[start..].to_vec();
        Self {
            symbol: symbol.into(),
            as_of: rows.last().map(|r| r.date),
            rows,
            pivots,
            plan,
            alerts,
        }
    }

    /// Compact line-oriented rendering. Same input, same text.
    pub fn to_text(&self) -> String {
        let mut s = String::new();
        let as_of = self
            .as_of
            .map_or_else(|| "-".to_string(), |d| d.to_string());
        let _ = writeln!(s, "SNAPSHOT {} as of {}", self.symbol, as_of);

        let _ = writeln!(s, "ROWS {}", self.rows.len());
        for r in &self.rows {
            let mpmi = match r.mpmi.value() {
                Some(m) => format!("{:.4}/{:.4}/{:.4}", m.line, m.signal, m.histogram),
                None => "-".to_string(),
            };
            let _ = writeln!(
                s,
                "{} o={:.4} h={:.4} l={:.4} c={:.4} mid={:.4} amp={:.4} avg_amp={} atr={} atr_chg={} pctl={} z={} mpmi={} cross={} star={} breakout={}",
                r.date,
                r.open,
                r.high,
                r.low,
                r.close,
                r.mid_price,
                r.amplitude,
                rolling(&r.avg_amplitude),
                rolling(&r.atr),
                rolling(&r.atr_change),
                rolling(&r.amplitude_percentile),
                rolling(&r.amplitude_zscore),
                mpmi,
                r.mpmi_cross.map_or_else(|| "-".to_string(), |c| format!("{c:?}").to_lowercase()),
                r.star.map_or_else(|| "-".to_string(), |c| format!("{c:?}").to_lowercase()),
                r.breakout.map_or_else(|| "-".to_string(), |b| format!("{b:?}").to_lowercase()),
            );
        }

        match &self.pivots {
            Some(p) => {
                let _ = write!(s, "PIVOTS {:?} ref={}", p.method, p.date);
                for (label, price) in p.members() {
                    let _ = write!(s, " {label}={price:.4}");
                }
                s.push('\n');
            }
            None => s.push_str("PIVOTS -\n"),
        }

        match &self.plan {
            Some(plan) => {
                let _ = writeln!(
                    s,
                    "GRID {:?} {:.4}..{:.4} levels={} ref={:.4}",
                    plan.spacing_mode,
                    plan.lower_bound,
                    plan.upper_bound,
                    plan.level_count(),
                    plan.reference_price
                );
                for level in plan.levels() {
                    let role = match level.role {
                        LevelRole::Buy => "buy",
                        LevelRole::Sell => "sell",
                        LevelRole::Neutral => "neutral",
                    };
                    let _ = write!(s, "L{} {:.4} {}", level.index, level.price, role);
                    if let Some(anchor) = level.anchor {
                        let _ = write!(s, " [{anchor}]");
                    }
                    s.push('\n');
                }
            }
            None => s.push_str("GRID -\n"),
        }

        let _ = writeln!(s, "ALERTS {}", self.alerts.len());
        for a in &self.alerts {
            let _ = writeln!(
                s,
                "{} {} {}: {}",
                a.timestamp.date_naive(),
                a.severity,
                a.kind,
                a.message
            );
        }

        s
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn rolling(value: &Rolling<f64>) -> String {
    value
        .value()
        .map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}
