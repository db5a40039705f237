//! Error types for the grid analysis system.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum MidgridError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bar error: {0}")]
    Bar(#[from] BarError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Pivot error: {0}")]
    Pivot(#[from] PivotError),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Backtest failed: {0}")]
    Backtest(#[from] BacktestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Price bar invariant violations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BarError {
    #[error("Invalid bar on {date}: {reason}")]
    InvalidBar { date: NaiveDate, reason: String },

    #[error("Bar on {date} at index {index} is not after the previous bar on {previous}")]
    OutOfOrder {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },
}

impl BarError {
    /// Date of the offending bar.
    pub fn date(&self) -> NaiveDate {
        match self {
            BarError::InvalidBar { date, .. } | BarError::OutOfOrder { date, .. } => *date,
        }
    }
}

/// Market-data ingestion errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Rejected bar at index {index}: {source}")]
    Rejected {
        index: usize,
        #[source]
        source: BarError,
    },

    #[error("Duplicate bar date: {0}")]
    DuplicateDate(NaiveDate),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Degenerate bar on {date} (index {index}): mid-price is zero or not finite")]
    DegenerateBar { date: NaiveDate, index: usize },

    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Pivot calculation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PivotError {
    #[error(transparent)]
    InvalidBar(#[from] BarError),

    #[error("Reference bar on {date} has zero range; pivot levels would collapse")]
    DegenerateRange { date: NaiveDate },

    #[error("No reference bar available: series has {available} bars")]
    NoReferenceBar { available: usize },
}

/// Grid planning errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Invalid range: lower {lower} must be positive and below upper {upper}, with at least 2 levels (got {level_count})")]
    InvalidRange {
        lower: f64,
        upper: f64,
        level_count: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Unrecoverable backtest failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BacktestError {
    #[error("Initial cash must be positive, got {0}")]
    NonPositiveCash(Decimal),

    #[error("Unit quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    #[error("Bar series is empty")]
    EmptySeries,

    #[error("Invalid bar at index {index}: {source}")]
    InvalidBar {
        index: usize,
        #[source]
        source: BarError,
    },

    #[error("Price {price} cannot be represented exactly")]
    UnrepresentablePrice { price: f64 },

    #[error("Simulator has already run")]
    AlreadyRun,
}

/// Result type alias.
pub type MidgridResult<T> = Result<T, MidgridError>;
