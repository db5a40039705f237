//! Market-data source trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::DataError;
use crate::types::{BarSeries, RawBar};

/// A market-data client delivering daily bars.
///
/// Implementations only fetch; validation happens at
/// [`BarSeries::ingest`], which [`BarSource::load_series`] calls.
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Fetch raw daily bars.
    ///
    /// # Arguments
    /// * `symbol` - The symbol to fetch
    /// * `start` - Inclusive start date, or the beginning of available data
    /// * `end` - Inclusive end date, or the end of available data
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<RawBar>, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;

    /// Fetch and ingest into a validated series.
    async fn load_series(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<BarSeries, DataError> {
        let raws = self.fetch_bars(symbol, start, end).await?;
        if raws.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        BarSeries::ingest(symbol, raws)
    }
}
