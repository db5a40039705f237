//! CSV data source.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::debug;

use midgrid_core::error::DataError;
use midgrid_core::traits::BarSource;
use midgrid_core::types::RawBar;

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

#[derive(Debug, Clone)]
enum Location {
    /// One file serving any symbol
    File(PathBuf),
    /// `<dir>/<SYMBOL>.csv`
    Directory(PathBuf),
}

/// CSV data source for historical daily bars.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    location: Location,
}

impl CsvDataSource {
    /// Serve every symbol from a single CSV file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            location: Location::File(path.to_path_buf()),
        })
    }

    /// Serve `<SYMBOL>.csv` files from a directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, DataError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            location: Location::Directory(dir.to_path_buf()),
        })
    }

    /// Pick [`from_dir`](Self::from_dir) or [`from_file`](Self::from_file)
    /// depending on what `path` is.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DataError> {
        if path.as_ref().is_dir() {
            Self::from_dir(path)
        } else {
            Self::from_file(path)
        }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        match &self.location {
            Location::File(path) => path.clone(),
            Location::Directory(dir) => dir.join(format!("{symbol}.csv")),
        }
    }

    fn parse(contents: &str) -> Result<Vec<RawBar>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes());

        let mut bars = Vec::new();
        for result in reader.deserialize() {
            let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            bars.push(RawBar {
                date: parse_date(&record.date)?,
                open: record.open,
                high: record.high,
                low: record.low,
                close: record.close,
                volume: record.volume,
            });
        }
        Ok(bars)
    }
}

#[async_trait]
impl BarSource for CsvDataSource {
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<RawBar>, DataError> {
        let path = self.path_for(symbol);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::SymbolNotFound(symbol.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let bars: Vec<RawBar> = Self::parse(&contents)?
            .into_iter()
            .filter(|b| start.map_or(true, |s| b.date >= s))
            .filter(|b| end.map_or(true, |e| b.date <= e))
            .collect();

        debug!(symbol, path = %path.display(), bars = bars.len(), "Read CSV bars");
        Ok(bars)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Parse the date formats found in common exports, or a Unix timestamp.
fn parse_date(date_str: &str) -> Result<NaiveDate, DataError> {
    let formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
    for format in formats {
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            return Ok(d);
        }
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.date());
        }
    }

    // Unix timestamp; milliseconds if > 10 digits
    if let Ok(ts) = date_str.parse::<i64>() {
        let dt = if ts > 10_000_000_000 {
            DateTime::from_timestamp_millis(ts)
        } else {
            DateTime::from_timestamp(ts, 0)
        };
        if let Some(dt) = dt {
            return Ok(dt.date_naive());
        }
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}
