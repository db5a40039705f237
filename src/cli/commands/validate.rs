//! Validate configuration command.

use anyhow::Result;
use midgrid_config::{AppConfig, ConfigError};
use std::path::Path;

pub async fn run(config_path: &Path, loaded: Result<AppConfig, ConfigError>) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    let config = match loaded.and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!("Symbol: {} ({})", config.data.symbol, config.data.csv_path);
    println!("Indicator window: {}", config.indicators.window);
    println!("Pivots: {:?} from {:?} bar", config.pivots.method, config.pivots.reference);
    println!(
        "Grid: {} levels, {:?} spacing, {:?} range",
        config.grid.level_count, config.grid.spacing_mode, config.grid.range_source
    );
    println!("Alerts enabled: {}", config.alerts.any_enabled());
    println!(
        "Backtest: cash {}, unit {}",
        config.backtest.initial_cash, config.backtest.unit_quantity
    );
    println!("Sweep cases: {}", config.sweep_cases().len());

    Ok(())
}
