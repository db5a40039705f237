//! Mid-price grid analysis CLI.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use midgrid_config::load_config;
use midgrid_monitor::setup_logging;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = load_config(&cli.config);

    // Logging follows the config when it loads; CLI flags win
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    let level = cli
        .log_level
        .map_or(logging.level.as_str(), |l| l.as_str());
    let _guard = setup_logging(
        level,
        cli.json_logs || logging.is_json(),
        logging.file.as_deref().map(Path::new),
    );

    if let Commands::ValidateConfig = cli.command {
        return cli::commands::validate::run(&cli.config, loaded).await;
    }

    let config = loaded
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    match cli.command {
        Commands::Analyze(args) => cli::commands::analyze::run(args, config).await,
        Commands::Backtest(args) => cli::commands::backtest::run(args, config).await,
        Commands::Sweep(args) => cli::commands::sweep::run(args, config).await,
        Commands::Snapshot(args) => cli::commands::snapshot::run(args, config).await,
        Commands::ValidateConfig => Ok(()),
    }
}
