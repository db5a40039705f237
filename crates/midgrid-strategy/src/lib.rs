//! Grid strategy planning.
//!
//! This crate turns indicator output into a trading plan:
//! - Pivot point, support and resistance levels (classic, Fibonacci)
//! - Grid planner (uniform, geometric, pivot-anchored spacing)
//! - Threshold alert evaluation

pub mod alerts;
pub mod grid;
pub mod pivot;

pub use alerts::{evaluate, AlertEvent, AlertKind, AlertThresholds, Severity};
pub use grid::{
    build, GridAdjustment, GridLevel, GridParams, GridPlan, GridPlanner, GridRange, LevelRole,
    PivotSpan, SpacingMode,
};
pub use pivot::{
    compute_with, select_reference, PivotLabel, PivotLevels, PivotMethod, ReferenceBar,
};
