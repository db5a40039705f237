//! Grid backtest simulator.
//!
//! Replays a bar series against a [`GridPlan`] in a single ascending pass.
//! Each level carries its own arm: an armed-buy level buys one unit when a
//! bar trades through it and cash allows, then arms to sell; an armed-sell
//! level sells one unit when the position allows, then arms to buy. A level
//! fills at most once per bar.

use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use midgrid_core::error::{BacktestError, BarError};
use midgrid_core::types::{BarSeries, Side};
use midgrid_strategy::{GridPlan, LevelRole};

use crate::statistics::{BacktestSummary, EquityPoint, StatsTracker, TradeRecord};

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_cash: Decimal,
    /// Quantity traded per fill
    pub unit_quantity: Decimal,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_cash: dec!(100000),
            unit_quantity: dec!(100),
        }
    }
}

/// Simulator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// What a grid level will do next time price reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelArm {
    ArmedBuy,
    ArmedSell,
}

impl LevelArm {
    /// Initial arm for a level role. Neutral levels start armed to sell.
    pub fn for_role(role: LevelRole) -> Self {
        match role {
            LevelRole::Buy => LevelArm::ArmedBuy,
            LevelRole::Sell | LevelRole::Neutral => LevelArm::ArmedSell,
        }
    }

    fn flipped(self) -> Self {
        match self {
            LevelArm::ArmedBuy => LevelArm::ArmedSell,
            LevelArm::ArmedSell => LevelArm::ArmedBuy,
        }
    }
}

/// Outcome of a completed backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub config: BacktestConfig,
    /// Fills in execution order
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub summary: BacktestSummary,
}

/// Single-use grid backtest simulator.
#[derive(Debug)]
pub struct GridSimulator {
    plan: GridPlan,
    config: BacktestConfig,
    state: RunState,
    failure: Option<BacktestError>,
}

impl GridSimulator {
    pub fn new(plan: GridPlan, config: BacktestConfig) -> Self {
        Self {
            plan,
            config,
            state: RunState::Idle,
            failure: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Error that moved the simulator to `Failed`.
    pub fn failure(&self) -> Option<&BacktestError> {
        self.failure.as_ref()
    }

    /// Replay `series` against the plan.
    ///
    /// Runs once: a second call fails with [`BacktestError::AlreadyRun`]
    /// without changing state.
    pub fn run(&mut self, series: &BarSeries) -> Result<BacktestResult, BacktestError> {
        if self.state != RunState::Idle {
            return Err(BacktestError::AlreadyRun);
        }

        self.state = RunState::Running;
        info!(
            symbol = %series.symbol,
            bars = series.len(),
            levels = self.plan.level_count(),
            "Backtest running"
        );

        match self.simulate(series) {
            Ok(result) => {
                self.state = RunState::Completed;
                info!(
                    symbol = %series.symbol,
                    trades = result.summary.trade_count,
                    final_equity = %result.summary.final_equity,
                    "Backtest completed"
                );
                Ok(result)
            }
            Err(e) => {
                self.state = RunState::Failed;
                warn!(symbol = %series.symbol, error = %e, "Backtest failed");
                self.failure = Some(e.clone());
                Err(e)
            }
        }
    }

    fn simulate(&self, series: &BarSeries) -> Result<BacktestResult, BacktestError> {
        let config = &self.config;
        if config.initial_cash <= Decimal::ZERO {
            return Err(BacktestError::NonPositiveCash(config.initial_cash));
        }
        if config.unit_quantity <= Decimal::ZERO {
            return Err(BacktestError::NonPositiveQuantity(config.unit_quantity));
        }
        if series.is_empty() {
            return Err(BacktestError::EmptySeries);
        }

        let levels = self.plan.levels();
        let level_prices: Vec<Decimal> = levels
            .iter()
            .map(|l| to_decimal(l.price))
            .collect::<Result<_, _>>()?;
        let mut arms: Vec<LevelArm> = levels.iter().map(|l| LevelArm::for_role(l.role)).collect();

        let unit = config.unit_quantity;
        let mut cash = config.initial_cash;
        let mut position = Decimal::ZERO;
        let mut avg_cost = Decimal::ZERO;
        let mut realized = Decimal::ZERO;
        let mut last_close = Decimal::ZERO;
        let mut stats = StatsTracker::new(config.initial_cash);

        for (index, bar) in series.iter().enumerate() {
            bar.validate()
                .map_err(|source| BacktestError::InvalidBar { index, source })?;
            if let Some(prev) = index.checked_sub(1).and_then(|i| series.get(i)) {
                if bar.date <= prev.date {
                    return Err(BacktestError::InvalidBar {
                        index,
                        source: BarError::OutOfOrder {
                            index,
                            date: bar.date,
                            previous: prev.date,
                        },
                    });
                }
            }

            let hit = self.plan.levels_between(bar.low, bar.high);
            let first = hit.first().map_or(0, |l| l.index);
            let touched = first..first + hit.len();
            let mut consumed = vec![false; levels.len()];

            // Buys from the highest level down
            for i in touched.clone().rev() {
                let price = level_prices[i];
                let overflow = || BacktestError::UnrepresentablePrice {
                    price: levels[i].price,
                };
                let cost = price.checked_mul(unit).ok_or_else(overflow)?;
                if arms[i] == LevelArm::ArmedBuy && cash >= cost {
                    let new_position = position.checked_add(unit).ok_or_else(overflow)?;
                    avg_cost = avg_cost
                        .checked_mul(position)
                        .and_then(|held| held.checked_add(cost))
                        .and_then(|total| total.checked_div(new_position))
                        .ok_or_else(overflow)?;
                    cash -= cost;
                    position = new_position;
                    arms[i] = arms[i].flipped();
                    consumed[i] = true;
                    debug!(date = %bar.date, level = i, %price, "Grid buy");
                    stats.add_trade(TradeRecord {
                        date: bar.date,
                        side: Side::Buy,
                        level_index: i,
                        price,
                        quantity: unit,
                        resulting_cash: cash,
                        resulting_position: position,
                        pnl: None,
                    });
                }
            }

            // Sells from the lowest level up
            for i in touched {
                if consumed[i] || arms[i] != LevelArm::ArmedSell || position < unit {
                    continue;
                }
                let price = level_prices[i];
                let overflow = || BacktestError::UnrepresentablePrice {
                    price: levels[i].price,
                };
                let pnl = (price - avg_cost).checked_mul(unit).ok_or_else(overflow)?;
                cash = price
                    .checked_mul(unit)
                    .and_then(|proceeds| cash.checked_add(proceeds))
                    .ok_or_else(overflow)?;
                position -= unit;
                realized = realized.checked_add(pnl).ok_or_else(overflow)?;
                if position.is_zero() {
                    avg_cost = Decimal::ZERO;
                }
                arms[i] = arms[i].flipped();
                consumed[i] = true;
                debug!(date = %bar.date, level = i, %price, %pnl, "Grid sell");
                stats.add_trade(TradeRecord {
                    date: bar.date,
                    side: Side::Sell,
                    level_index: i,
                    price,
                    quantity: unit,
                    resulting_cash: cash,
                    resulting_position: position,
                    pnl: Some(pnl),
                });
            }

            last_close = to_decimal(bar.close)?;
            stats.record_equity(EquityPoint {
                date: bar.date,
                cash,
                position,
                close: last_close,
                equity: mark_to_market(cash, position, last_close, bar.close)?,
            });
        }

        let final_close = series.last().map_or(0.0, |b| b.close);
        let final_equity = mark_to_market(cash, position, last_close, final_close)?;
        let unrealized = (last_close - avg_cost)
            .checked_mul(position)
            .ok_or(BacktestError::UnrepresentablePrice { price: final_close })?;
        let summary = stats.finalize(final_equity, realized, unrealized);

        Ok(BacktestResult {
            symbol: series.symbol.clone(),
            config: config.clone(),
            trades: stats.trades,
            equity_curve: stats.equity_curve,
            summary,
        })
    }
}

/// Run a one-off backtest with the default unit quantity.
pub fn run(
    series: &BarSeries,
    plan: &GridPlan,
    initial_cash: Decimal,
) -> Result<BacktestResult, BacktestError> {
    let config = BacktestConfig {
        initial_cash,
        ..BacktestConfig::default()
    };
    GridSimulator::new(plan.clone(), config).run(series)
}

/// `cash + position * close`, failing when the value leaves Decimal's range.
fn mark_to_market(
    cash: Decimal,
    position: Decimal,
    close: Decimal,
    raw_close: f64,
) -> Result<Decimal, BacktestError> {
    position
        .checked_mul(close)
        .and_then(|value| cash.checked_add(value))
        .ok_or(BacktestError::UnrepresentablePrice { price: raw_close })
}

fn to_decimal(price: f64) -> Result<Decimal, BacktestError> {
    Decimal::from_f64(price)
        .map(|d| d.normalize())
        .ok_or(BacktestError::UnrepresentablePrice { price })
}
