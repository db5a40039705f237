//! Market-data sources for the grid analysis system.

mod cache;
mod csv_source;

pub use cache::SeriesCache;
pub use csv_source::CsvDataSource;
