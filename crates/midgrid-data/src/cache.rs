//! Series caching.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use midgrid_core::error::DataError;
use midgrid_core::traits::BarSource;
use midgrid_core::types::BarSeries;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    symbol: String,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl CacheKey {
    fn new(symbol: &str, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            symbol: symbol.to_string(),
            start,
            end,
        }
    }
}

/// In-memory cache of ingested series, owned by the caller.
///
/// Entries are keyed by symbol and the requested date range.
#[derive(Debug, Default)]
pub struct SeriesCache {
    cache: HashMap<CacheKey, BarSeries>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached series.
    pub fn get(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Option<&BarSeries> {
        self.cache.get(&CacheKey::new(symbol, start, end))
    }

    /// Store a series, replacing any previous entry for the same range.
    pub fn put(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>, series: BarSeries) {
        let key = CacheKey::new(&series.symbol, start, end);
        self.cache.insert(key, series);
    }

    /// Return the cached series, loading it from `source` on a miss.
    ///
    /// Failed loads are not cached.
    pub async fn get_or_load(
        &mut self,
        source: &dyn BarSource,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<&BarSeries, DataError> {
        let key = CacheKey::new(symbol, start, end);
        if !self.cache.contains_key(&key) {
            let series = source.load_series(symbol, start, end).await?;
            debug!(symbol, source = source.name(), bars = series.len(), "Cached series");
            self.cache.insert(key.clone(), series);
        }
        self.cache.get(&key).ok_or(DataError::NoDataAvailable)
    }

    /// Drop every cached range for a symbol.
    pub fn clear(&mut self, symbol: &str) {
        self.cache.retain(|k, _| k.symbol != symbol);
    }

    /// Clear all cached data.
    pub fn clear_all(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use midgrid_core::types::RawBar;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BarSource for CountingSource {
        async fn fetch_bars(
            &self,
            symbol: &str,
            _start: Option<NaiveDate>,
            _end: Option<NaiveDate>,
        ) -> Result<Vec<RawBar>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol == "MISSING" {
                return Err(DataError::SymbolNotFound(symbol.to_string()));
            }
            Ok((1..=3)
                .map(|day| RawBar {
                    date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                    open: 20.0,
                    high: 21.0,
                    low: 19.0,
                    close: 20.5,
                    volume: 100.0,
                })
                .collect())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn source() -> CountingSource {
        CountingSource {
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_get_or_load_hits_source_once() {
        let source = source();
        let mut cache = SeriesCache::new();

        let len = cache.get_or_load(&source, "ACME", None, None).await.unwrap().len();
        assert_eq!(len, 3);
        cache.get_or_load(&source, "ACME", None, None).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(cache.get("ACME", None, None).is_some());
    }

    #[tokio::test]
    async fn test_ranges_cached_separately() {
        let source = source();
        let mut cache = SeriesCache::new();
        let start = NaiveDate::from_ymd_opt(2024, 5, 2);

        cache.get_or_load(&source, "ACME", None, None).await.unwrap();
        cache.get_or_load(&source, "ACME", start, None).await.unwrap();
        cache.get_or_load(&source, "OTHER", None, None).await.unwrap();
        assert_eq!(cache.len(), 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        cache.clear("ACME");
        assert_eq!(cache.len(), 1);
        assert!(cache.get("OTHER", None, None).is_some());

        cache.clear_all();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_not_cached() {
        let source = source();
        let mut cache = SeriesCache::new();

        let result = cache.get_or_load(&source, "MISSING", None, None).await;
        assert!(matches!(result, Err(DataError::SymbolNotFound(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_uses_series_symbol() {
        let mut cache = SeriesCache::new();
        cache.put(None, None, BarSeries::empty("EMPTY"));
        assert!(cache.get("EMPTY", None, None).is_some());
        assert!(cache.get("OTHER", None, None).is_none());
    }
}
