//! Backtest ledger records and summary statistics.

use chrono::NaiveDate;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use midgrid_core::types::Side;
use tracing::warn;

/// Record of a single fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub side: Side,
    /// Grid level that filled
    pub level_index: usize,
    pub price: Decimal,
    pub quantity: Decimal,
    pub resulting_cash: Decimal,
    pub resulting_position: Decimal,
    /// Realized P&L against the average cost, sells only
    pub pnl: Option<Decimal>,
}

/// Ledger state at the close of one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub cash: Decimal,
    pub position: Decimal,
    pub close: Decimal,
    pub equity: Decimal,
}

/// Performance summary of a completed backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub initial_cash: Decimal,
    /// Cash plus position valued at the last close
    pub final_equity: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    /// Largest peak-to-trough equity drop
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: Decimal,
    pub total_return_pct: Decimal,
    pub trade_count: usize,
    pub buy_count: usize,
    pub sell_count: usize,
    /// Share of sells with positive P&L
    pub win_rate_pct: Decimal,
    /// Annualized, zero risk-free rate
    pub sharpe_ratio: f64,
    pub bars_processed: usize,
}

/// Accumulates equity and trades during a run.
#[derive(Debug, Clone)]
pub(crate) struct StatsTracker {
    initial_cash: Decimal,
    peak_equity: Decimal,
    max_drawdown: Decimal,
    max_drawdown_pct: Decimal,
    daily_returns: Vec<f64>,
    pub(crate) equity_curve: Vec<EquityPoint>,
    pub(crate) trades: Vec<TradeRecord>,
}

impl StatsTracker {
    pub(crate) fn new(initial_cash: Decimal) -> Self {
        Self {
            initial_cash,
            peak_equity: initial_cash,
            max_drawdown: Decimal::ZERO,
            max_drawdown_pct: Decimal::ZERO,
            daily_returns: Vec::new(),
            equity_curve: Vec::new(),
            trades: Vec::new(),
        }
    }

    pub(crate) fn record_equity(&mut self, point: EquityPoint) {
        let equity = point.equity;

        let prev_equity = self
            .equity_curve
            .last()
            .map_or(self.initial_cash, |p| p.equity);
        if prev_equity > Decimal::ZERO {
            let ratio = (equity - prev_equity) / prev_equity;
            match ratio.to_f64() {
                Some(ret) => self.daily_returns.push(ret),
                None => warn!(
                    date = %point.date,
                    %ratio,
                    "Daily return not representable as f64; skipped"
                ),
            }
        }

        self.equity_curve.push(point);

        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        let drawdown = self.peak_equity - equity;
        if drawdown > self.max_drawdown {
            self.max_drawdown = drawdown;
        }
        if self.peak_equity > Decimal::ZERO {
            let drawdown_pct = drawdown / self.peak_equity * dec!(100);
            if drawdown_pct > self.max_drawdown_pct {
                self.max_drawdown_pct = drawdown_pct;
            }
        }
    }

    pub(crate) fn add_trade(&mut self, trade: TradeRecord) {
        self.trades.push(trade);
    }

    pub(crate) fn finalize(
        &self,
        final_equity: Decimal,
        realized_pnl: Decimal,
        unrealized_pnl: Decimal,
    ) -> BacktestSummary {
        let buy_count = self.trades.iter().filter(|t| t.side == Side::Buy).count();
        let sells: Vec<&TradeRecord> = self.trades.iter().filter(|t| t.side == Side::Sell).collect();
        let winners = sells
            .iter()
            .filter(|t| t.pnl.is_some_and(|pnl| pnl > Decimal::ZERO))
            .count();

        let win_rate_pct = if sells.is_empty() {
            Decimal::ZERO
        } else {
            Decimal::from(winners * 100) / Decimal::from(sells.len())
        };

        let total_return_pct = if self.initial_cash > Decimal::ZERO {
            (final_equity - self.initial_cash) / self.initial_cash * dec!(100)
        } else {
            Decimal::ZERO
        };

        BacktestSummary {
            initial_cash: self.initial_cash,
            final_equity,
            realized_pnl,
            unrealized_pnl,
            max_drawdown: self.max_drawdown,
            max_drawdown_pct: self.max_drawdown_pct,
            total_return_pct,
            trade_count: self.trades.len(),
            buy_count,
            sell_count: sells.len(),
            win_rate_pct,
            sharpe_ratio: sharpe_ratio(&self.daily_returns),
            bars_processed: self.equity_curve.len(),
        }
    }
}

/// Annualized Sharpe ratio of daily returns (252 trading days).
pub fn sharpe_ratio(daily_returns: &[f64]) -> f64 {
    if daily_returns.is_empty() {
        return 0.0;
    }
    let n = daily_returns.len() as f64;
    let mean = daily_returns.iter().sum::<f64>() / n;
    let variance = daily_returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev > 0.0 {
        mean * 252.0_f64.sqrt() / std_dev
    } else {
        0.0
    }
}
