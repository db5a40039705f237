//! Snapshot command implementation.

use anyhow::Result;
use midgrid_config::AppConfig;
use midgrid_monitor::Snapshot;

use super::{analyze_series, apply_data_args, apply_grid_args, load_series};
use crate::cli::{OutputFormat, SnapshotArgs};

pub async fn run(args: SnapshotArgs, mut config: AppConfig) -> Result<()> {
    apply_data_args(&mut config, &args.data);
    apply_grid_args(&mut config, &args.grid);
    config.validate()?;

    let series = load_series(&config).await?;
    let analysis = analyze_series(&config, &series)?;
    let snapshot = Snapshot::new(
        &series.symbol,
        &analysis.rows,
        args.rows,
        Some(analysis.pivots),
        Some(analysis.plan),
        analysis.alerts,
    );

    match args.output {
        OutputFormat::Text => print!("{}", snapshot.to_text()),
        OutputFormat::Json => println!("{}", snapshot.to_json()?),
    }
    Ok(())
}
