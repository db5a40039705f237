//! Grid planning.
//!
//! A [`GridPlan`] is an ordered ladder of price levels between a lower and an
//! upper bound. Levels below the reference price are buy levels, levels above
//! are sell levels, and the level nearest the reference price is neutral.
//!
//! Three spacing modes are supported:
//! - `uniform`: constant price step
//! - `geometric`: constant ratio between neighbours
//! - `pivot_anchored`: uniform levels snapped onto nearby pivot levels, with
//!   the remaining slots re-spaced between the snapped ones. Levels closer
//!   than the minimum spacing are merged and the merge is reported.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use midgrid_core::error::GridError;
use midgrid_core::types::BarSeries;

use crate::pivot::{PivotLabel, PivotLevels};

/// How levels are distributed between the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacingMode {
    #[default]
    Uniform,
    PivotAnchored,
    Geometric,
}

/// What a level does when price reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelRole {
    Buy,
    Sell,
    Neutral,
}

/// One rung of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLevel {
    pub index: usize,
    pub price: f64,
    pub role: LevelRole,
    /// Pivot member this level snapped to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<PivotLabel>,
}

/// Level-count change caused by merging levels closer than the minimum
/// spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridAdjustment {
    pub requested: usize,
    pub actual: usize,
    pub merged: usize,
}

/// Grid planning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Requested number of levels, bounds included
    pub level_count: usize,
    pub spacing_mode: SpacingMode,
    /// Minimum distance between pivot-anchored levels, as a fraction of the
    /// grid range
    pub min_spacing_pct: f64,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            level_count: 10,
            spacing_mode: SpacingMode::Uniform,
            min_spacing_pct: 0.02,
        }
    }
}

/// Lower and upper bound of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridRange {
    pub lower: f64,
    pub upper: f64,
}

/// Which pivot members bound a pivot-derived range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotSpan {
    /// `s3..r3`
    #[default]
    Outer,
    /// `s1..r1`
    Inner,
}

impl GridRange {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn from_pivots(levels: &PivotLevels, span: PivotSpan) -> Self {
        match span {
            PivotSpan::Outer => Self::new(levels.s3, levels.r3),
            PivotSpan::Inner => Self::new(levels.s1, levels.r1),
        }
    }

    /// Lowest low to highest high over the last `lookback` bars.
    pub fn from_recent(series: &BarSeries, lookback: usize) -> Result<Self, GridError> {
        if lookback == 0 {
            return Err(GridError::InvalidParameter(
                "lookback must be positive".to_string(),
            ));
        }
        let recent = series.last_n(lookback);
        if recent.is_empty() {
            return Err(GridError::InvalidParameter(
                "cannot derive a range from an empty series".to_string(),
            ));
        }
        let lower = recent.iter().map(|b| b.low).fold(f64::MAX, f64::min);
        let upper = recent.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        Ok(Self::new(lower, upper))
    }
}

/// An ordered ladder of grid levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPlan {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub spacing_mode: SpacingMode,
    /// Price the roles were assigned against
    pub reference_price: f64,
    levels: Vec<GridLevel>,
    /// Present when levels were merged
    pub adjustment: Option<GridAdjustment>,
}

impl GridPlan {
    /// Levels in strictly increasing price order.
    pub fn levels(&self) -> &[GridLevel] {
        &self.levels
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.price).collect()
    }

    /// The neutral level.
    pub fn neutral_level(&self) -> Option<&GridLevel> {
        self.levels.iter().find(|l| l.role == LevelRole::Neutral)
    }

    /// Level closest to `price`; ties go to the lower level.
    pub fn nearest_level(&self, price: f64) -> Option<&GridLevel> {
        nearest_index(&self.prices(), price).map(|i| &self.levels[i])
    }

    /// Levels with `low <= price <= high`, ascending.
    pub fn levels_between(&self, low: f64, high: f64) -> &[GridLevel] {
        let start = self.levels.partition_point(|l| l.price < low);
        let end = self.levels.partition_point(|l| l.price <= high);
        &self.levels[start..end.max(start)]
    }

    pub fn contains(&self, price: f64) -> bool {
        self.lower_bound <= price && price <= self.upper_bound
    }
}

/// Builds [`GridPlan`]s from a range and a reference price.
#[derive(Debug, Clone, Default)]
pub struct GridPlanner {
    params: GridParams,
}

impl GridPlanner {
    pub fn new(params: GridParams) -> Result<Self, GridError> {
        validate_params(&params)?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &GridParams {
        &self.params
    }

    /// Build a plan over `range`, assigning roles against `reference_price`.
    ///
    /// `anchor` is only consulted in pivot-anchored mode.
    pub fn plan(
        &self,
        range: GridRange,
        reference_price: f64,
        anchor: Option<&PivotLevels>,
    ) -> Result<GridPlan, GridError> {
        let p = &self.params;
        validate_params(p)?;
        validate_range(range.lower, range.upper, p.level_count)?;
        if !reference_price.is_finite() {
            return Err(GridError::InvalidParameter(format!(
                "reference price must be finite, got {reference_price}"
            )));
        }

        let (lower, upper, n) = (range.lower, range.upper, p.level_count);
        let (raw, adjustment) = match p.spacing_mode {
            SpacingMode::Uniform => (unanchored(uniform_prices(lower, upper, n)), None),
            SpacingMode::Geometric => (unanchored(geometric_prices(lower, upper, n)), None),
            SpacingMode::PivotAnchored => {
                let snapped = snap_to_pivots(lower, upper, n, anchor);
                let merged = merge_close(snapped, p.min_spacing_pct * (upper - lower));
                let adjustment = (merged.len() != n).then(|| GridAdjustment {
                    requested: n,
                    actual: merged.len(),
                    merged: n - merged.len(),
                });
                (merged, adjustment)
            }
        };

        if raw.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(GridError::InvalidParameter(format!(
                "range {lower}..{upper} is too narrow for {n} distinct levels"
            )));
        }

        let prices: Vec<f64> = raw.iter().map(|(price, _)| *price).collect();
        let neutral = nearest_index(&prices, reference_price).unwrap_or(0);
        let levels = raw
            .into_iter()
            .enumerate()
            .map(|(index, (price, anchor))| GridLevel {
                index,
                price,
                role: match index.cmp(&neutral) {
                    Ordering::Less => LevelRole::Buy,
                    Ordering::Equal => LevelRole::Neutral,
                    Ordering::Greater => LevelRole::Sell,
                },
                anchor,
            })
            .collect();

        if let Some(adj) = adjustment {
            info!(
                requested = adj.requested,
                actual = adj.actual,
                "Merged grid levels closer than minimum spacing"
            );
        }
        debug!(
            lower = format!("{:.4}", lower),
            upper = format!("{:.4}", upper),
            levels = prices.len(),
            mode = ?p.spacing_mode,
            "Built grid plan"
        );

        Ok(GridPlan {
            lower_bound: lower,
            upper_bound: upper,
            spacing_mode: p.spacing_mode,
            reference_price,
            levels,
            adjustment,
        })
    }
}

/// Build a grid plan between explicit bounds.
///
/// Uses the default minimum spacing for pivot-anchored plans.
pub fn build(
    lower_bound: f64,
    upper_bound: f64,
    level_count: usize,
    spacing_mode: SpacingMode,
    anchor: Option<&PivotLevels>,
    reference_price: f64,
) -> Result<GridPlan, GridError> {
    validate_range(lower_bound, upper_bound, level_count)?;
    let planner = GridPlanner::new(GridParams {
        level_count,
        spacing_mode,
        ..GridParams::default()
    })?;
    planner.plan(
        GridRange::new(lower_bound, upper_bound),
        reference_price,
        anchor,
    )
}

fn validate_params(params: &GridParams) -> Result<(), GridError> {
    if !(0.0..1.0).contains(&params.min_spacing_pct) {
        return Err(GridError::InvalidParameter(format!(
            "min_spacing_pct must be in [0, 1), got {}",
            params.min_spacing_pct
        )));
    }
    Ok(())
}

fn validate_range(lower: f64, upper: f64, level_count: usize) -> Result<(), GridError> {
    let valid = lower.is_finite() && upper.is_finite() && lower > 0.0 && lower < upper;
    if !valid || level_count < 2 {
        return Err(GridError::InvalidRange {
            lower,
            upper,
            level_count,
        });
    }
    Ok(())
}

fn unanchored(prices: Vec<f64>) -> Vec<(f64, Option<PivotLabel>)> {
    prices.into_iter().map(|p| (p, None)).collect()
}

fn uniform_prices(lower: f64, upper: f64, n: usize) -> Vec<f64> {
    let step = (upper - lower) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { upper } else { lower + i as f64 * step })
        .collect()
}

fn geometric_prices(lower: f64, upper: f64, n: usize) -> Vec<f64> {
    let ratio = (upper / lower).powf(1.0 / (n - 1) as f64);
    (0..n)
        .map(|i| if i == n - 1 { upper } else { lower * ratio.powi(i as i32) })
        .collect()
}

fn nearest_index(prices: &[f64], target: f64) -> Option<usize> {
    prices
        .iter()
        .enumerate()
        .min_by(|(ia, a), (ib, b)| {
            (*a - target)
                .abs()
                .total_cmp(&(*b - target).abs())
                .then(ia.cmp(ib))
        })
        .map(|(i, _)| i)
}

/// Snap interior uniform slots onto pivot members within half a step, then
/// re-space the free slots between their snapped neighbours.
fn snap_to_pivots(
    lower: f64,
    upper: f64,
    n: usize,
    anchor: Option<&PivotLevels>,
) -> Vec<(f64, Option<PivotLabel>)> {
    let uniform = uniform_prices(lower, upper, n);
    let Some(pivots) = anchor else {
        return unanchored(uniform);
    };

    let step = (upper - lower) / (n - 1) as f64;
    let members: Vec<(PivotLabel, f64)> = pivots
        .members()
        .into_iter()
        .filter(|(_, price)| *price > lower && *price < upper)
        .collect();

    // (distance, slot, member), nearest first
    let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
    for (slot, &price) in uniform.iter().enumerate().take(n - 1).skip(1) {
        for (m, &(_, member)) in members.iter().enumerate() {
            let distance = (price - member).abs();
            if distance <= step / 2.0 {
                pairs.push((distance, slot, m));
            }
        }
    }
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut slots: Vec<Option<(f64, Option<PivotLabel>)>> = vec![None; n];
    slots[0] = Some((lower, None));
    slots[n - 1] = Some((upper, None));
    let mut used = vec![false; members.len()];
    for (_, slot, m) in pairs {
        if slots[slot].is_none() && !used[m] {
            let (label, price) = members[m];
            slots[slot] = Some((price, Some(label)));
            used[m] = true;
        }
    }

    let fixed: Vec<usize> = (0..n).filter(|&i| slots[i].is_some()).collect();
    let mut out = Vec::with_capacity(n);
    for pair in fixed.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let (pa, anchor_a) = slots[a].unwrap_or((lower, None));
        let pb = slots[b].map_or(upper, |(p, _)| p);
        out.push((pa, anchor_a));
        let gap = (pb - pa) / (b - a) as f64;
        for k in 1..(b - a) {
            out.push((pa + k as f64 * gap, None));
        }
    }
    out.push((upper, None));
    out
}

/// Drop levels closer than `min_distance` to their kept predecessor.
///
/// Both bounds are always kept, and an anchored level wins over an
/// unanchored neighbour.
fn merge_close(
    levels: Vec<(f64, Option<PivotLabel>)>,
    min_distance: f64,
) -> Vec<(f64, Option<PivotLabel>)> {
    let last = levels.len().saturating_sub(1);
    let mut kept: Vec<(f64, Option<PivotLabel>)> = Vec::with_capacity(levels.len());

    for (i, level) in levels.into_iter().enumerate() {
        let Some(&prev) = kept.last() else {
            kept.push(level);
            continue;
        };
        if level.0 - prev.0 >= min_distance {
            kept.push(level);
            continue;
        }

        let prev_is_lower_bound = kept.len() == 1;
        if i == last {
            if !prev_is_lower_bound {
                kept.pop();
            }
            kept.push(level);
        } else if !prev_is_lower_bound && prev.1.is_none() && level.1.is_some() {
            kept.pop();
            kept.push(level);
        }
    }

    kept
}
