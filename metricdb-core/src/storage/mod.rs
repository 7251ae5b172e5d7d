//! Storage engine - write path, read path and the store facade

mod scanner;
mod store;
mod writer;

pub use scanner::RangeScanner;
pub use store::{MetricStore, StoreStats};
pub use writer::Writer;

use crate::config::{DATA_DIR_ENV, DEFAULT_DATA_DIR, DEFAULT_TIMESHIFT_MS, TIMESHIFT_ENV};
use crate::{MetricError, Result};
use std::path::PathBuf;

/// Store configuration
///
/// The partition width is fixed for the lifetime of a data directory: files
/// written under one width are not found by range scans under another.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Data directory
    pub data_dir: PathBuf,
    /// Partition width in milliseconds
    pub timeshift_ms: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            timeshift_ms: DEFAULT_TIMESHIFT_MS,
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by `METRICDB_DATA_DIR` and `METRICDB_PARTITION_TIMESHIFT`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(dir) = lookup(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(TIMESHIFT_ENV) {
            config.timeshift_ms = raw.trim().parse().map_err(|_| {
                MetricError::Config(format!("{} is not an integer: {:?}", TIMESHIFT_ENV, raw))
            })?;
        }
        Ok(config)
    }
}
