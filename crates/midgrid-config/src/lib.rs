//! Configuration management.

mod settings;

pub use settings::{
    AppConfig, AppSettings, BacktestSettings, DataSettings, GridSettings, LoggingConfig,
    PivotSettings, RangeSource, SweepSettings,
};

use config::{Config, Environment, File};
use midgrid_core::MidgridError;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for MidgridError {
    fn from(e: ConfigError) -> Self {
        MidgridError::Config(e.to_string())
    }
}

/// Load configuration from file and environment.
///
/// `MIDGRID__GRID__LEVEL_COUNT=12` overrides `grid.level_count`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    load_layered(path, environment())
}

fn environment() -> Environment {
    Environment::with_prefix("MIDGRID")
        .separator("__")
        .try_parsing(true)
}

fn load_layered(path: &Path, env: Environment) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(env)
        .build()?;

    Ok(config.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[pivots]\nmethod = \"fibonacci\"\n\n[grid]\nrange_source = \"recent\"\nlookback = 30"
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.pivots.method, midgrid_strategy::PivotMethod::Fibonacci);
        assert_eq!(config.grid.range_source, RangeSource::Recent);
        assert_eq!(config.grid.lookback, 30);
        assert_eq!(config.grid.level_count, 10);
        config.validate().unwrap();
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[app]\nenvironment = \"file\"\n").unwrap();

        // An explicit variable map keeps the process environment untouched
        let vars: config::Map<String, String> = [
            ("MIDGRID__APP__ENVIRONMENT", "env"),
            ("MIDGRID__GRID__LEVEL_COUNT", "12"),
            ("OTHER__GRID__LEVEL_COUNT", "99"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let config = load_layered(&path, environment().source(Some(vars))).unwrap();

        assert_eq!(config.app.environment, "env");
        assert_eq!(config.grid.level_count, 12);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_config(Path::new("/nonexistent/midgrid.toml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
