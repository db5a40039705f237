//! Logging setup and text snapshots of an analysis.

mod logging;
mod snapshot;

pub use logging::setup_logging;
pub use snapshot::Snapshot;
