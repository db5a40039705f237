//! Grid backtesting.
//!
//! Replays a bar series against a grid plan with a cash/position ledger,
//! producing trade records, an equity curve and a performance summary.

mod engine;
mod report;
mod statistics;
mod sweep;

pub use engine::{run, BacktestConfig, BacktestResult, GridSimulator, LevelArm, RunState};
pub use statistics::{sharpe_ratio, BacktestSummary, EquityPoint, TradeRecord};
pub use sweep::{run_sweep, SweepCase, SweepEntry, SweepInputs};
