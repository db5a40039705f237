//! Configuration structures.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use midgrid_backtest::{BacktestConfig, SweepCase};
use midgrid_indicators::IndicatorParams;
use midgrid_strategy::{
    AlertThresholds, GridParams, GridPlanner, PivotMethod, PivotSpan, ReferenceBar, SpacingMode,
};

use crate::ConfigError;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub indicators: IndicatorParams,
    #[serde(default)]
    pub pivots: PivotSettings,
    #[serde(default)]
    pub grid: GridSettings,
    #[serde(default)]
    pub alerts: AlertThresholds,
    #[serde(default)]
    pub backtest: BacktestSettings,
    #[serde(default)]
    pub sweep: SweepSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "midgrid".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Directory for a daily rolling log file
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Where bars come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataSettings {
    pub symbol: String,
    /// A CSV file, or a directory of `<SYMBOL>.csv` files
    pub csv_path: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            csv_path: "data".to_string(),
            start: None,
            end: None,
        }
    }
}

/// Pivot settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PivotSettings {
    pub method: PivotMethod,
    pub reference: ReferenceBar,
}

/// How the grid bounds are chosen.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RangeSource {
    /// Span of the reference bar's pivot levels
    #[default]
    Pivots,
    /// Lowest low to highest high over `lookback` bars
    Recent,
    /// `lower` and `upper` as configured
    Explicit,
}

/// Grid settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridSettings {
    pub level_count: usize,
    pub spacing_mode: SpacingMode,
    pub min_spacing_pct: f64,
    pub range_source: RangeSource,
    pub pivot_span: PivotSpan,
    pub lookback: usize,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Default for GridSettings {
    fn default() -> Self {
        let params = GridParams::default();
        Self {
            level_count: params.level_count,
            spacing_mode: params.spacing_mode,
            min_spacing_pct: params.min_spacing_pct,
            range_source: RangeSource::default(),
            pivot_span: PivotSpan::default(),
            lookback: 20,
            lower: None,
            upper: None,
        }
    }
}

impl GridSettings {
    pub fn params(&self) -> GridParams {
        GridParams {
            level_count: self.level_count,
            spacing_mode: self.spacing_mode,
            min_spacing_pct: self.min_spacing_pct,
        }
    }
}

/// Backtest settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_cash: Decimal,
    pub unit_quantity: Decimal,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        use rust_decimal_macros::dec;
        Self {
            initial_cash: dec!(100000),
            unit_quantity: dec!(100),
        }
    }
}

/// Parameter sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SweepSettings {
    pub level_counts: Vec<usize>,
    pub spacing_modes: Vec<SpacingMode>,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            level_counts: vec![5, 10, 15, 20],
            spacing_modes: vec![SpacingMode::Uniform, SpacingMode::Geometric],
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl AppConfig {
    /// Parse a TOML document; missing sections take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reject settings no component would accept.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return invalid(format!("logging.level must be one of {LOG_LEVELS:?}"));
        }
        if !matches!(self.logging.format.to_ascii_lowercase().as_str(), "pretty" | "json") {
            return invalid(format!(
                "logging.format must be pretty or json, got {}",
                self.logging.format
            ));
        }

        if self.data.symbol.trim().is_empty() {
            return invalid("data.symbol must not be empty".to_string());
        }
        if let (Some(start), Some(end)) = (self.data.start, self.data.end) {
            if start > end {
                return invalid(format!("data.start {start} is after data.end {end}"));
            }
        }

        self.indicators
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("indicators: {e}")))?;

        if self.grid.level_count < 2 {
            return invalid(format!(
                "grid.level_count must be at least 2, got {}",
                self.grid.level_count
            ));
        }
        GridPlanner::new(self.grid.params())
            .map_err(|e| ConfigError::Invalid(format!("grid: {e}")))?;
        match self.grid.range_source {
            RangeSource::Recent if self.grid.lookback == 0 => {
                return invalid("grid.lookback must be positive".to_string());
            }
            RangeSource::Explicit => match (self.grid.lower, self.grid.upper) {
                (Some(lower), Some(upper)) if lower > 0.0 && lower < upper => {}
                (Some(lower), Some(upper)) => {
                    return invalid(format!(
                        "grid.lower {lower} must be positive and below grid.upper {upper}"
                    ));
                }
                _ => {
                    return invalid(
                        "grid.lower and grid.upper are required for an explicit range".to_string(),
                    );
                }
            },
            _ => {}
        }

        self.alerts
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.backtest.initial_cash <= Decimal::ZERO {
            return invalid(format!(
                "backtest.initial_cash must be positive, got {}",
                self.backtest.initial_cash
            ));
        }
        if self.backtest.unit_quantity <= Decimal::ZERO {
            return invalid(format!(
                "backtest.unit_quantity must be positive, got {}",
                self.backtest.unit_quantity
            ));
        }

        if self.sweep.level_counts.is_empty() || self.sweep.spacing_modes.is_empty() {
            return invalid("sweep needs at least one level count and spacing mode".to_string());
        }
        if let Some(n) = self.sweep.level_counts.iter().find(|&&n| n < 2) {
            return invalid(format!("sweep.level_counts entries must be at least 2, got {n}"));
        }

        Ok(())
    }

    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            initial_cash: self.backtest.initial_cash,
            unit_quantity: self.backtest.unit_quantity,
        }
    }

    pub fn sweep_cases(&self) -> Vec<SweepCase> {
        SweepCase::grid(&self.sweep.level_counts, &self.sweep.spacing_modes)
    }
}
