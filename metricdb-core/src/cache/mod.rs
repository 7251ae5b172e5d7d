//! Cache of open partition write handles
//!
//! Writes for the same partition reuse one open file. Handles are opened
//! lazily on first write and closed when the eviction policy in
//! [`RecentPartitions`] decides a key has moved on, when a key opens a bucket
//! two or more ahead of them, or on shutdown.

mod handle;
mod tracker;

pub use handle::PartitionHandle;
pub use tracker::RecentPartitions;

use crate::partition::PartitionKey;
use crate::{MetricKey, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Concurrent map from partition to its open append handle
pub struct HandleCache {
    dir: PathBuf,
    handles: DashMap<PartitionKey, Arc<PartitionHandle>>,
    opens: AtomicU64,
    evictions: AtomicU64,
}

impl HandleCache {
    /// Create an empty cache for partition files under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            handles: DashMap::new(),
            opens: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Directory holding the partition files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Return the cached handle for `partition`, opening the file if needed.
    ///
    /// The open happens under the map entry lock, so racing callers for a new
    /// partition open the file exactly once. A failed open inserts nothing.
    pub fn get_or_open(&self, partition: PartitionKey) -> Result<Arc<PartitionHandle>> {
        if let Some(handle) = self.handles.get(&partition) {
            return Ok(Arc::clone(handle.value()));
        }

        match self.handles.entry(partition) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let handle = Arc::new(PartitionHandle::open(partition, &self.dir)?);
                self.opens.fetch_add(1, Ordering::Relaxed);
                info!(
                    partition = %partition,
                    path = ?handle.path(),
                    "Opened partition for writing"
                );
                entry.insert(Arc::clone(&handle));
                Ok(handle)
            }
        }
    }

    /// Remove and close the handle for `partition`, if cached.
    ///
    /// Close failures are logged; the entry is gone either way.
    pub fn evict(&self, partition: &PartitionKey) {
        if let Some((_, handle)) = self.handles.remove(partition) {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            Self::close(&handle);
        } else {
            debug!(partition = %partition, "Nothing to evict");
        }
    }

    /// Evict every handle of `key` whose bucket index is at or below `index`.
    ///
    /// Returns the number of handles closed.
    pub fn evict_through(&self, key: MetricKey, index: i64) -> usize {
        let stale: Vec<PartitionKey> = self
            .handles
            .iter()
            .map(|entry| *entry.key())
            .filter(|p| p.key() == key && p.index() <= index)
            .collect();
        for partition in &stale {
            self.evict(partition);
        }
        stale.len()
    }

    /// Evict every cached handle
    pub fn close_all(&self) {
        let partitions: Vec<PartitionKey> = self.handles.iter().map(|entry| *entry.key()).collect();
        for partition in &partitions {
            self.evict(partition);
        }
        if !partitions.is_empty() {
            info!("Closed {} partition handles", partitions.len());
        }
    }

    /// Whether `partition` currently has a cached handle
    pub fn contains(&self, partition: &PartitionKey) -> bool {
        self.handles.contains_key(partition)
    }

    /// Number of cached handles
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True when no handle is cached
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Total number of files opened for writing
    pub fn opens(&self) -> u64 {
        self.opens.load(Ordering::Relaxed)
    }

    /// Total number of handles evicted
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    fn close(handle: &PartitionHandle) {
        match handle.sync() {
            Ok(()) => info!(partition = %handle.partition(), "Closed partition handle"),
            Err(e) => error!(
                partition = %handle.partition(),
                path = ?handle.path(),
                error = %e,
                "Failed to close partition handle"
            ),
        }
    }
}

impl std::fmt::Debug for HandleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleCache")
            .field("dir", &self.dir)
            .field("open_handles", &self.handles.len())
            .finish()
    }
}
