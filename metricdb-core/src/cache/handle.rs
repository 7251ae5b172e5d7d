//! Appendable partition file handle

use crate::partition::PartitionKey;
use crate::Result;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// An open, append-only partition file.
///
/// Shared through `Arc`: a handle evicted from the cache stays usable by
/// writers that already hold it, and the descriptor is released when the last
/// holder drops it.
#[derive(Debug)]
pub struct PartitionHandle {
    partition: PartitionKey,
    path: PathBuf,
    file: Mutex<File>,
}

impl PartitionHandle {
    /// Open (creating if needed) the partition file under `dir` for appending
    pub fn open(partition: PartitionKey, dir: &Path) -> Result<Self> {
        let path = partition.path_in(dir);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            partition,
            path,
            file: Mutex::new(file),
        })
    }

    /// Partition this handle writes to
    pub fn partition(&self) -> PartitionKey {
        self.partition
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one encoded record in a single write
    pub fn append(&self, buf: &[u8]) -> Result<()> {
        let mut file = self.file.lock();
        file.write_all(buf)?;
        Ok(())
    }

    /// Flush file data to stable storage
    pub fn sync(&self) -> Result<()> {
        self.file.lock().sync_data()?;
        Ok(())
    }
}
