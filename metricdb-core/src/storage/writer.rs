//! Write path

use crate::cache::{HandleCache, RecentPartitions};
use crate::config::EVICTION_DISTANCE;
use crate::partition::{PartitionKey, Timeshift};
use crate::record::Record;
use crate::{validate_key, Result, Sample};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// Appends samples to their partition files
pub struct Writer {
    timeshift: Timeshift,
    cache: Arc<HandleCache>,
    recent: RecentPartitions,
    writes: AtomicU64,
    failed_writes: AtomicU64,
}

impl Writer {
    /// Create a writer over a shared handle cache
    pub fn new(timeshift: Timeshift, cache: Arc<HandleCache>) -> Self {
        Self {
            timeshift,
            cache,
            recent: RecentPartitions::new(),
            writes: AtomicU64::new(0),
            failed_writes: AtomicU64::new(0),
        }
    }

    /// Append a sample.
    ///
    /// Failures are logged and counted, never returned: the sample is lost
    /// and the cache is left consistent.
    pub fn write(&self, sample: Sample) {
        match self.try_write(sample) {
            Ok(()) => {
                self.writes.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed_writes.fetch_add(1, Ordering::Relaxed);
                error!(sample = %sample, error = %e, "Failed to write sample");
            }
        }
    }

    fn try_write(&self, sample: Sample) -> Result<()> {
        validate_key(sample.key)?;
        let partition = PartitionKey::new(sample.key, sample.timestamp, self.timeshift);

        if let Some(stale) = self.recent.advance(partition) {
            debug!(stale = %stale, current = %partition, "Evicting stale partition");
            self.cache.evict(&stale);
        }

        // Opening a new bucket also closes this key's handles left behind by
        // late writes, keeping one bucket of lateness open.
        if !self.cache.contains(&partition) {
            let through = partition.index().saturating_sub(EVICTION_DISTANCE);
            let closed = self.cache.evict_through(sample.key, through);
            if closed > 0 {
                debug!(key = %sample.key, through, closed, "Evicted trailing partitions");
            }
        }

        let handle = self.cache.get_or_open(partition)?;
        handle.append(&Record::new(sample.timestamp, sample.value).encode())
    }

    /// Forget per-key tracking, used on shutdown
    pub fn reset_tracking(&self) {
        self.recent.clear();
    }

    /// Samples appended successfully
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Samples dropped because of an error
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RECORD_SIZE;
    use tempfile::TempDir;

    fn writer(dir: &std::path::Path) -> (Writer, Arc<HandleCache>) {
        let cache = Arc::new(HandleCache::new(dir));
        let writer = Writer::new(Timeshift::new(60).unwrap(), Arc::clone(&cache));
        (writer, cache)
    }

    #[test]
    fn test_write_appends_record() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, _cache) = writer(temp_dir.path());

        writer.write(Sample::new(61, 'a', 7));
        writer.write(Sample::new(62, 'a', 8));

        let data = std::fs::read(temp_dir.path().join("a-60")).unwrap();
        assert_eq!(data.len(), 2 * RECORD_SIZE);
        assert_eq!(Record::decode(&data), Some(Record::new(61, 7)));
        assert_eq!(Record::decode(&data[RECORD_SIZE..]), Some(Record::new(62, 8)));
        assert_eq!(writer.writes(), 2);
    }

    #[test]
    fn test_advancing_key_evicts_old_handle() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, cache) = writer(temp_dir.path());

        writer.write(Sample::new(0, 'a', 1));
        writer.write(Sample::new(60, 'a', 1));
        assert_eq!(cache.len(), 2);

        // Two buckets past the tracked partition (60) closes it, and bucket 0
        // with it
        writer.write(Sample::new(180, 'a', 1));
        let timeshift = Timeshift::new(60).unwrap();
        assert!(!cache.contains(&PartitionKey::new('a', 60, timeshift)));
        assert!(!cache.contains(&PartitionKey::new('a', 0, timeshift)));
        assert_eq!(cache.evictions(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_steady_forward_writes_bound_open_handles() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, cache) = writer(temp_dir.path());

        for ts in 0..60 * 500 {
            writer.write(Sample::new(ts, 'a', 1));
            assert!(cache.len() <= 2, "{} handles open at ts {}", cache.len(), ts);
        }
        assert_eq!(cache.opens(), 500);
        assert_eq!(cache.evictions(), 498);
    }

    #[test]
    fn test_one_bucket_late_keeps_handle() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, cache) = writer(temp_dir.path());

        writer.write(Sample::new(0, 'a', 1));
        writer.write(Sample::new(60, 'a', 1));
        writer.write(Sample::new(59, 'a', 1));
        writer.write(Sample::new(61, 'a', 1));
        assert_eq!(cache.opens(), 2);
        assert_eq!(cache.evictions(), 0);
    }

    #[test]
    fn test_handles_orphaned_by_late_writes_are_closed() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, cache) = writer(temp_dir.path());

        // The late write to bucket 0 replaces bucket 10 as the tracked one
        writer.write(Sample::new(600, 'a', 1));
        writer.write(Sample::new(0, 'a', 1));
        assert_eq!(cache.len(), 2);

        writer.write(Sample::new(720, 'a', 1));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&PartitionKey::new('a', 720, Timeshift::new(60).unwrap())));
    }

    #[test]
    fn test_failed_write_is_counted() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, cache) = writer(&temp_dir.path().join("missing"));

        writer.write(Sample::new(0, 'a', 1));
        assert_eq!(writer.failed_writes(), 1);
        assert_eq!(writer.writes(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalid_key_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let (writer, cache) = writer(temp_dir.path());

        writer.write(Sample::new(0, '/', 1));
        assert_eq!(writer.failed_writes(), 1);
        assert!(cache.is_empty());
    }
}
