//! Time partitioning
//!
//! Every sample lands in the partition named by its metric key and the start
//! of its time bucket. Buckets are `timeshift` milliseconds wide and aligned
//! to zero, so the writer and the scanner derive the same file name from a
//! timestamp without any shared catalog.
//!
//! ```text
//! <data_dir>/
//! ├── a-0
//! ├── a-60000
//! ├── a--60000      # key 'a', bucket -60000
//! └── b-120000
//! ```

use crate::{MetricError, MetricKey, Result, Timestamp};
use std::fmt;
use std::path::{Path, PathBuf};

/// Separator between key and bucket in a partition file name
pub const NAME_SEPARATOR: char = '-';

/// Width of one partition in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeshift(i64);

impl Timeshift {
    /// Create a timeshift, rejecting non-positive widths
    pub fn new(millis: i64) -> Result<Self> {
        if millis <= 0 {
            return Err(MetricError::Config(format!(
                "partition timeshift must be positive, got {}",
                millis
            )));
        }
        Ok(Self(millis))
    }

    /// Width in milliseconds
    pub fn millis(&self) -> i64 {
        self.0
    }

    /// Bucket index of a timestamp, rounding toward negative infinity
    pub fn index(&self, ts: Timestamp) -> i64 {
        ts.div_euclid(self.0)
    }

    /// Start of the bucket holding `ts`
    ///
    /// Computed in 128 bits: the bucket of a timestamp close to `i64::MIN`
    /// starts below `i64::MIN`.
    pub fn bucket(&self, ts: Timestamp) -> i128 {
        self.bucket_start(self.index(ts))
    }

    /// Start of the bucket with the given index
    pub fn bucket_start(&self, index: i64) -> i128 {
        index as i128 * self.0 as i128
    }
}

/// Identity of one partition file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    key: MetricKey,
    index: i64,
    timeshift: Timeshift,
}

impl PartitionKey {
    /// Partition holding the sample `(key, ts)`
    pub fn new(key: MetricKey, ts: Timestamp, timeshift: Timeshift) -> Self {
        Self::from_index(key, timeshift.index(ts), timeshift)
    }

    /// Partition at a known bucket index
    pub fn from_index(key: MetricKey, index: i64, timeshift: Timeshift) -> Self {
        Self {
            key,
            index,
            timeshift,
        }
    }

    /// Metric key
    pub fn key(&self) -> MetricKey {
        self.key
    }

    /// Bucket index
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Bucket start in milliseconds
    pub fn bucket(&self) -> i128 {
        self.timeshift.bucket_start(self.index)
    }

    /// Number of buckets `self` lies ahead of `earlier`; negative when behind
    pub fn buckets_ahead_of(&self, earlier: &PartitionKey) -> i128 {
        self.index as i128 - earlier.index as i128
    }

    /// File name, `<key>-<bucket>`
    pub fn file_name(&self) -> String {
        format!("{}{}{}", self.key, NAME_SEPARATOR, self.bucket())
    }

    /// Full path of the partition file under `dir`
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }

    /// Parse a partition file name back into its identity.
    ///
    /// Returns `None` for names that are not partitions or whose bucket is not
    /// aligned to `timeshift` (written under a different width).
    pub fn parse_file_name(name: &str, timeshift: Timeshift) -> Option<Self> {
        let mut chars = name.chars();
        let key = chars.next()?;
        let rest = chars.as_str().strip_prefix(NAME_SEPARATOR)?;
        let bucket: i128 = rest.parse().ok()?;
        let width = timeshift.millis() as i128;
        if bucket.rem_euclid(width) != 0 {
            return None;
        }
        let index = i64::try_from(bucket.div_euclid(width)).ok()?;
        Some(Self::from_index(key, index, timeshift))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}
