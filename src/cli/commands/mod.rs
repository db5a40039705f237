//! CLI command implementations.

pub mod analyze;
pub mod backtest;
pub mod snapshot;
pub mod sweep;
pub mod validate;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use midgrid_config::{AppConfig, RangeSource};
use midgrid_core::traits::BarSource;
use midgrid_core::types::BarSeries;
use midgrid_data::CsvDataSource;
use midgrid_indicators::{IndicatorEngine, IndicatorRow};
use midgrid_strategy::{
    compute_with, evaluate, select_reference, AlertEvent, GridPlan, GridPlanner, GridRange,
    PivotLevels,
};

use crate::cli::{DataArgs, GridArgs};

/// Everything derived from one series.
pub struct Analysis {
    pub rows: Vec<IndicatorRow>,
    pub pivots: PivotLevels,
    pub plan: GridPlan,
    pub alerts: Vec<AlertEvent>,
}

pub fn apply_data_args(config: &mut AppConfig, args: &DataArgs) {
    if let Some(symbol) = &args.symbol {
        config.data.symbol = symbol.clone();
    }
    if let Some(path) = &args.data {
        config.data.csv_path = path.display().to_string();
    }
    if args.start.is_some() {
        config.data.start = args.start;
    }
    if args.end.is_some() {
        config.data.end = args.end;
    }
}

pub fn apply_grid_args(config: &mut AppConfig, args: &GridArgs) {
    if let Some(levels) = args.levels {
        config.grid.level_count = levels;
    }
    if let Some(spacing) = args.spacing {
        config.grid.spacing_mode = spacing.into();
    }
    if let (Some(lower), Some(upper)) = (args.lower, args.upper) {
        config.grid.range_source = RangeSource::Explicit;
        config.grid.lower = Some(lower);
        config.grid.upper = Some(upper);
    }
}

pub async fn load_series(config: &AppConfig) -> Result<BarSeries> {
    let data = &config.data;
    let source = CsvDataSource::open(&data.csv_path).with_context(|| {
        format!(
            "Data path '{}' is not a CSV file or directory (set data.csv_path or pass --data)",
            data.csv_path
        )
    })?;
    let series = source
        .load_series(&data.symbol, data.start, data.end)
        .await
        .with_context(|| format!("Failed to load bars for {}", data.symbol))?;

    info!(symbol = %series.symbol, bars = series.len(), "Loaded series");
    Ok(series)
}

/// Indicator rows for every usable bar; degenerate bars are skipped with a
/// warning.
pub fn indicator_rows(config: &AppConfig, series: &BarSeries) -> Result<Vec<IndicatorRow>> {
    let engine = IndicatorEngine::new(config.indicators.clone())?;
    let mut rows = Vec::with_capacity(series.len());
    for result in engine.compute_each(series)? {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!(error = %e, "Skipping bar"),
        }
    }
    Ok(rows)
}

pub fn grid_range(config: &AppConfig, series: &BarSeries, pivots: &PivotLevels) -> Result<GridRange> {
    let grid = &config.grid;
    let range = match grid.range_source {
        RangeSource::Pivots => GridRange::from_pivots(pivots, grid.pivot_span),
        RangeSource::Recent => GridRange::from_recent(series, grid.lookback)?,
        RangeSource::Explicit => {
            let lower = grid.lower.context("grid.lower is required for an explicit range")?;
            let upper = grid.upper.context("grid.upper is required for an explicit range")?;
            GridRange::new(lower, upper)
        }
    };
    Ok(range)
}

/// Pivots of the configured reference bar and a grid around the latest mid.
pub fn plan_grid(config: &AppConfig, series: &BarSeries) -> Result<(PivotLevels, GridPlan)> {
    let reference = select_reference(series, config.pivots.reference)?;
    let pivots = compute_with(reference, config.pivots.method)
        .with_context(|| format!("Failed to compute pivots from the bar on {}", reference.date))?;

    let latest = series.last().context("Series is empty")?;
    let range = grid_range(config, series, &pivots)?;
    let plan = GridPlanner::new(config.grid.params())?
        .plan(range, latest.mid_price(), Some(&pivots))
        .context("Failed to plan grid")?;

    Ok((pivots, plan))
}

/// Split `series` into the bars a replay plans from and the bars it trades.
///
/// The plan only sees the first `grid.lookback` bars (at least two, so a
/// previous reference bar exists); every later bar is replayed against it.
pub fn split_for_replay(config: &AppConfig, series: &BarSeries) -> Result<(BarSeries, BarSeries)> {
    let warmup = config.grid.lookback.max(2);
    if series.len() <= warmup {
        bail!(
            "Need more than {warmup} bars to plan on the first {warmup} and replay the rest, got {}",
            series.len()
        );
    }
    let (head, tail) = series.bars().split_at(warmup);
    let history = BarSeries::new(series.symbol.clone(), head.to_vec())?;
    let replay = BarSeries::new(series.symbol.clone(), tail.to_vec())?;
    Ok((history, replay))
}

pub fn analyze_series(config: &AppConfig, series: &BarSeries) -> Result<Analysis> {
    let rows = indicator_rows(config, series)?;
    let (pivots, plan) = plan_grid(config, series)?;
    let alerts = match rows.last() {
        Some(latest) => evaluate(latest, &rows, Some(&plan), &config.alerts),
        None => Vec::new(),
    };

    Ok(Analysis {
        rows,
        pivots,
        plan,
        alerts,
    })
}
