//! Backtest command implementation.

use anyhow::{Context, Result};
use midgrid_backtest::GridSimulator;
use midgrid_config::AppConfig;
use tracing::info;

use super::{apply_data_args, apply_grid_args, load_series, plan_grid, split_for_replay};
use crate::cli::{BacktestArgs, OutputFormat};

pub async fn run(args: BacktestArgs, mut config: AppConfig) -> Result<()> {
    apply_data_args(&mut config, &args.data);
    apply_grid_args(&mut config, &args.grid);
    if let Some(cash) = args.cash {
        config.backtest.initial_cash = cash;
    }
    config.validate()?;

    let series = load_series(&config).await?;
    let (history, replay) = split_for_replay(&config, &series)?;
    let (_, plan) = plan_grid(&config, &history)?;
    info!(
        symbol = %series.symbol,
        planning_bars = history.len(),
        replay_bars = replay.len(),
        levels = plan.level_count(),
        lower = plan.lower_bound,
        upper = plan.upper_bound,
        "Starting grid backtest"
    );

    let result = GridSimulator::new(plan, config.backtest_config())
        .run(&replay)
        .context("Backtest failed")?;

    match args.output {
        OutputFormat::Json => println!("{}", result.to_json()?),
        OutputFormat::Text => println!("{}", result.summary_text()),
    }

    if let Some(path) = &args.save {
        std::fs::write(path, result.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Results saved to {:?}", path);
    }
    if let Some(path) = &args.equity_csv {
        std::fs::write(path, result.equity_to_csv()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Equity curve saved to {:?}", path);
    }
    if let Some(path) = &args.trades_csv {
        std::fs::write(path, result.trades_to_csv()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Trades saved to {:?}", path);
    }

    Ok(())
}
