//! Sweep command implementation.

use anyhow::{Context, Result};
use midgrid_backtest::{run_sweep, SweepInputs};
use midgrid_config::AppConfig;

use super::{apply_data_args, grid_range, load_series, plan_grid, split_for_replay};
use crate::cli::{OutputFormat, SweepArgs};

pub async fn run(args: SweepArgs, mut config: AppConfig) -> Result<()> {
    apply_data_args(&mut config, &args.data);
    if !args.levels.is_empty() {
        config.sweep.level_counts = args.levels.clone();
    }
    config.validate()?;

    let series = load_series(&config).await?;
    let (history, replay) = split_for_replay(&config, &series)?;
    let (pivots, _) = plan_grid(&config, &history)?;
    let latest = history.last().context("Series is empty")?;

    let inputs = SweepInputs {
        range: grid_range(&config, &history, &pivots)?,
        reference_price: latest.mid_price(),
        anchor: Some(pivots),
        min_spacing_pct: config.grid.min_spacing_pct,
        config: config.backtest_config(),
    };
    let entries = run_sweep(&replay, &inputs, &config.sweep_cases());

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            println!(
                "{:<4} {:<16} {:>7} {:>10} {:>10} {:>7} {:>8}",
                "rank", "spacing", "levels", "return%", "max_dd%", "trades", "sharpe"
            );
            for (rank, entry) in entries.iter().enumerate() {
                let spacing = format!("{:?}", entry.case.spacing_mode);
                match (&entry.summary, &entry.error) {
                    (Some(s), _) => println!(
                        "{:<4} {:<16} {:>7} {:>10.2} {:>10.2} {:>7} {:>8.2}",
                        rank + 1,
                        spacing,
                        entry.actual_levels,
                        s.total_return_pct,
                        s.max_drawdown_pct,
                        s.trade_count,
                        s.sharpe_ratio
                    ),
                    (None, error) => println!(
                        "{:<4} {:<16} {:>7} failed: {}",
                        rank + 1,
                        spacing,
                        entry.case.level_count,
                        error.as_deref().unwrap_or("unknown error")
                    ),
                }
            }
        }
    }
    Ok(())
}
