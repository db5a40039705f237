//! Backtest report generation.

use crate::engine::BacktestResult;

impl BacktestResult {
    /// Generate a text summary.
    pub fn summary_text(&self) -> String {
        let stats = &self.summary;
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str(&format!("                GRID BACKTEST REPORT: {}\n", self.symbol));
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Initial Cash:        ${:.2}\n", stats.initial_cash));
        s.push_str(&format!("  Final Equity:        ${:.2}\n", stats.final_equity));
        s.push_str(&format!("  Total Return:        {:.2}%\n", stats.total_return_pct));
        s.push_str(&format!("  Realized P&L:        ${:.2}\n", stats.realized_pnl));
        s.push_str(&format!("  Unrealized P&L:      ${:.2}\n", stats.unrealized_pnl));
        s.push_str(&format!(
            "  Max Drawdown:        ${:.2} ({:.2}%)\n",
            stats.max_drawdown, stats.max_drawdown_pct
        ));
        s.push_str(&format!("  Sharpe Ratio:        {:.2}\n", stats.sharpe_ratio));
        s.push('\n');

        s.push_str("TRADE STATISTICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Total Trades:        {}\n", stats.trade_count));
        s.push_str(&format!(
            "  Buys / Sells:        {} / {}\n",
            stats.buy_count, stats.sell_count
        ));
        s.push_str(&format!("  Win Rate:            {:.2}%\n", stats.win_rate_pct));
        s.push_str(&format!("  Unit Quantity:       {}\n", self.config.unit_quantity));
        s.push('\n');

        s.push_str("EXECUTION\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Bars Processed:      {}\n", stats.bars_processed));
        s.push_str(&format!("  Equity Points:       {}\n", self.equity_curve.len()));
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export the equity curve as CSV.
    pub fn equity_to_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for point in &self.equity_curve {
            writer.serialize(point)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Export the trade ledger as CSV.
    pub fn trades_to_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "date",
            "side",
            "level_index",
            "price",
            "quantity",
            "resulting_cash",
            "resulting_position",
            "pnl",
        ])?;
        for t in &self.trades {
            writer.write_record([
                t.date.to_string(),
                t.side.to_string(),
                t.level_index.to_string(),
                t.price.to_string(),
                t.quantity.to_string(),
                t.resulting_cash.to_string(),
                t.resulting_position.to_string(),
                t.pnl.map(|p| p.to_string()).unwrap_or_default(),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
