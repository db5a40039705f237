//! Parallel parameter sweep over grid shapes.

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use midgrid_core::types::BarSeries;
use midgrid_strategy::{GridParams, GridPlanner, GridRange, PivotLevels, SpacingMode};

use crate::engine::{BacktestConfig, GridSimulator};
use crate::statistics::BacktestSummary;

/// One grid shape to test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepCase {
    pub level_count: usize,
    pub spacing_mode: SpacingMode,
}

impl SweepCase {
    /// Every combination of `level_counts` and `modes`.
    pub fn grid(level_counts: &[usize], modes: &[SpacingMode]) -> Vec<SweepCase> {
        modes
            .iter()
            .flat_map(|&spacing_mode| {
                level_counts.iter().map(move |&level_count| SweepCase {
                    level_count,
                    spacing_mode,
                })
            })
            .collect()
    }
}

/// Inputs shared by every case.
#[derive(Debug, Clone)]
pub struct SweepInputs {
    pub range: GridRange,
    pub reference_price: f64,
    pub anchor: Option<PivotLevels>,
    pub min_spacing_pct: f64,
    pub config: BacktestConfig,
}

/// Result of one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub case: SweepCase,
    /// Levels actually planned after any merge
    pub actual_levels: usize,
    pub summary: Option<BacktestSummary>,
    pub error: Option<String>,
}

impl SweepEntry {
    fn total_return(&self) -> Option<Decimal> {
        self.summary.as_ref().map(|s| s.total_return_pct)
    }
}

/// Run one backtest per case in parallel.
///
/// Entries are ranked by total return, best first; failed cases go last.
/// Ties keep case order.
pub fn run_sweep(series: &BarSeries, inputs: &SweepInputs, cases: &[SweepCase]) -> Vec<SweepEntry> {
    info!(symbol = %series.symbol, cases = cases.len(), "Running grid sweep");

    let mut entries: Vec<SweepEntry> = cases
        .par_iter()
        .map(|&case| run_case(series, inputs, case))
        .collect();

    entries.sort_by(|a, b| match (a.total_return(), b.total_return()) {
        (Some(ra), Some(rb)) => rb.cmp(&ra),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    if let Some(best) = entries.first().filter(|e| e.summary.is_some()) {
        info!(
            level_count = best.case.level_count,
            mode = ?best.case.spacing_mode,
            total_return_pct = ?best.total_return(),
            "Sweep complete"
        );
    }

    entries
}

fn run_case(series: &BarSeries, inputs: &SweepInputs, case: SweepCase) -> SweepEntry {
    let params = GridParams {
        level_count: case.level_count,
        spacing_mode: case.spacing_mode,
        min_spacing_pct: inputs.min_spacing_pct,
    };
    let plan = GridPlanner::new(params)
        .and_then(|p| p.plan(inputs.range, inputs.reference_price, inputs.anchor.as_ref()));

    let plan = match plan {
        Ok(plan) => plan,
        Err(e) => {
            return SweepEntry {
                case,
                actual_levels: 0,
                summary: None,
                error: Some(e.to_string()),
            }
        }
    };

    let actual_levels = plan.level_count();
    match GridSimulator::new(plan, inputs.config.clone()).run(series) {
        Ok(result) => SweepEntry {
            case,
            actual_levels,
            summary: Some(result.summary),
            error: None,
        },
        Err(e) => SweepEntry {
            case,
            actual_levels,
            summary: None,
            error: Some(e.to_string()),
        },
    }
}
