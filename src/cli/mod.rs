//! CLI definitions.

pub mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use midgrid_strategy::SpacingMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "midgrid")]
#[command(author, version, about = "Mid-price grid planning, alerting and backtesting")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level; defaults to the configured level
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute indicators, pivots, the grid plan and alerts
    Analyze(AnalyzeArgs),
    /// Plan on the first `grid.lookback` bars and replay the grid over the rest
    Backtest(BacktestArgs),
    /// Backtest many grid shapes over the bars after the planning window
    Sweep(SweepArgs),
    /// Print a compact text snapshot of the latest analysis
    Snapshot(SnapshotArgs),
    /// Validate configuration
    ValidateConfig,
}

/// Overrides for the configured data section.
#[derive(clap::Args)]
pub struct DataArgs {
    /// Symbol to load
    #[arg(short = 'S', long)]
    pub symbol: Option<String>,

    /// Data file or directory (CSV)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

/// Overrides for the configured grid section.
#[derive(clap::Args)]
pub struct GridArgs {
    /// Number of grid levels
    #[arg(long)]
    pub levels: Option<usize>,

    /// Level spacing
    #[arg(long, value_enum)]
    pub spacing: Option<Spacing>,

    /// Explicit lower bound; requires --upper
    #[arg(long, requires = "upper")]
    pub lower: Option<f64>,

    /// Explicit upper bound; requires --lower
    #[arg(long, requires = "lower")]
    pub upper: Option<f64>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Spacing {
    Uniform,
    PivotAnchored,
    Geometric,
}

impl From<Spacing> for SpacingMode {
    fn from(s: Spacing) -> Self {
        match s {
            Spacing::Uniform => SpacingMode::Uniform,
            Spacing::PivotAnchored => SpacingMode::PivotAnchored,
            Spacing::Geometric => SpacingMode::Geometric,
        }
    }
}

#[derive(clap::Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Number of latest rows to print
    #[arg(long, default_value = "10")]
    pub rows: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Initial cash
    #[arg(long)]
    pub cash: Option<rust_decimal::Decimal>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Save the full result as JSON
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Write the equity curve as CSV
    #[arg(long)]
    pub equity_csv: Option<PathBuf>,

    /// Write the trade ledger as CSV
    #[arg(long)]
    pub trades_csv: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct SweepArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Level counts to try (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub levels: Vec<usize>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Number of latest rows to include
    #[arg(long, default_value = "5")]
    pub rows: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}
