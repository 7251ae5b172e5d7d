//! Store facade - the public add/sum/close surface

use super::{RangeScanner, StoreConfig, Writer};
use crate::cache::HandleCache;
use crate::partition::Timeshift;
use crate::{MetricKey, Result, Sample, TimeRange, Timestamp};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Time-partitioned metric store
///
/// Safe to share between threads. Writes never fail the caller; reads
/// surface I/O errors.
pub struct MetricStore {
    data_dir: PathBuf,
    timeshift: Timeshift,
    cache: Arc<HandleCache>,
    writer: Writer,
    scanner: RangeScanner,
}

impl MetricStore {
    /// Open a store rooted at `data_dir`, creating the directory if absent
    pub fn open(data_dir: impl AsRef<Path>, timeshift_ms: i64) -> Result<Self> {
        Self::with_config(StoreConfig {
            data_dir: data_dir.as_ref().to_path_buf(),
            timeshift_ms,
        })
    }

    /// Open a store from a configuration
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        let timeshift = Timeshift::new(config.timeshift_ms)?;
        fs::create_dir_all(&config.data_dir)?;
        // Fail now rather than on the first write if the directory is unusable
        fs::read_dir(&config.data_dir)?;

        let data_dir = config.data_dir;
        let cache = Arc::new(HandleCache::new(data_dir.clone()));
        let writer = Writer::new(timeshift, Arc::clone(&cache));
        let scanner = RangeScanner::new(data_dir.clone(), timeshift);

        info!(dir = ?data_dir, timeshift_ms = timeshift.millis(), "Opened metric store");

        Ok(Self {
            data_dir,
            timeshift,
            cache,
            writer,
            scanner,
        })
    }

    /// Append a sample
    pub fn add(&self, timestamp: Timestamp, key: MetricKey, value: i32) {
        self.writer.write(Sample::new(timestamp, key, value));
    }

    /// Append a sample
    pub fn add_sample(&self, sample: Sample) {
        self.writer.write(sample);
    }

    /// Sum of values for `key` over `[start_inclusive, end_exclusive)`
    pub fn sum(
        &self,
        start_inclusive: Timestamp,
        end_exclusive: Timestamp,
        key: MetricKey,
    ) -> Result<i64> {
        self.scanner.sum(key, TimeRange::new(start_inclusive, end_exclusive))
    }

    /// Close every cached write handle.
    ///
    /// Idempotent. A later `add` reopens the partitions it needs.
    pub fn close(&self) {
        self.cache.close_all();
        self.writer.reset_tracking();
    }

    /// Data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Partition width
    pub fn timeshift(&self) -> Timeshift {
        self.timeshift
    }

    /// Get store statistics
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            timeshift_ms: self.timeshift.millis(),
            open_handles: self.cache.len(),
            partitions_opened: self.cache.opens(),
            evictions: self.cache.evictions(),
            writes: self.writer.writes(),
            failed_writes: self.writer.failed_writes(),
        }
    }
}

impl Drop for MetricStore {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for MetricStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricStore")
            .field("data_dir", &self.data_dir)
            .field("timeshift", &self.timeshift)
            .field("cache", &self.cache)
            .finish()
    }
}

/// Store statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub timeshift_ms: i64,
    pub open_handles: usize,
    pub partitions_opened: u64,
    pub evictions: u64,
    pub writes: u64,
    pub failed_writes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricError;
    use rand::seq::SliceRandom;
    use tempfile::TempDir;

    #[test]
    fn test_metric_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetricStore::open(temp_dir.path(), 60).unwrap();

        let mut timestamps: Vec<i64> = (0..130).collect();
        timestamps.shuffle(&mut rand::thread_rng());
        for ts in timestamps {
            store.add(ts, 'x', 1);
        }

        let cases = [
            (0, 60, 60),
            (10, 50, 40),
            (0, 90, 90),
            (30, 90, 60),
            (0, 120, 120),
            (90, 120, 30),
            (0, 125, 125),
            (95, 125, 30),
        ];
        for (start, end, expected) in cases {
            assert_eq!(store.sum(start, end, 'x').unwrap(), expected, "[{}, {})", start, end);
        }
    }

    #[test]
    fn test_open_creates_nested_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("a").join("b");
        let store = MetricStore::open(&dir, 60).unwrap();
        assert!(dir.is_dir());
        assert_eq!(store.data_dir(), dir.as_path());
    }

    #[test]
    fn test_open_rejects_file_path() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(MetricStore::open(&file, 60), Err(MetricError::Io(_))));
    }

    #[test]
    fn test_open_rejects_bad_timeshift() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(MetricStore::open(temp_dir.path(), 0), Err(MetricError::Config(_))));
    }

    #[test]
    fn test_close_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetricStore::open(temp_dir.path(), 60).unwrap();
        store.add(0, 'a', 1);
        store.add(0, 'b', 2);
        assert_eq!(store.stats().open_handles, 2);

        store.close();
        store.close();
        assert_eq!(store.stats().open_handles, 0);

        // Writes after close reopen lazily
        store.add(1, 'a', 3);
        assert_eq!(store.sum(0, 60, 'a').unwrap(), 4);
    }

    #[test]
    fn test_reopen_sees_previous_data() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = MetricStore::open(temp_dir.path(), 60).unwrap();
            store.add(5, 'k', 10);
            store.add(65, 'k', 20);
        }
        let store = MetricStore::open(temp_dir.path(), 60).unwrap();
        store.add(125, 'k', 30);
        assert_eq!(store.sum(0, 200, 'k').unwrap(), 60);
    }

    #[test]
    fn test_stats() {
        let temp_dir = TempDir::new().unwrap();
        let store = MetricStore::open(temp_dir.path(), 60).unwrap();
        store.add(0, 'a', 1);
        store.add(200, 'a', 1);
        store.add(0, '/', 1);

        let stats = store.stats();
        assert_eq!(stats.timeshift_ms, 60);
        assert_eq!(stats.writes, 2);
        assert_eq!(stats.failed_writes, 1);
        assert_eq!(stats.partitions_opened, 2);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.open_handles, 1);
    }
}
