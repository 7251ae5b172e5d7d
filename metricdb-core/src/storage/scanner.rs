//! Read path: range sums over partition files

use crate::config::DIRECTORY_SCAN_THRESHOLD;
use crate::partition::{PartitionKey, Timeshift};
use crate::record::RecordReader;
use crate::{validate_key, MetricKey, Result, TimeRange};
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sums record values across the partitions covering a time range.
///
/// Read handles are opened per call and closed before the next file; nothing
/// is cached on the read path.
#[derive(Debug, Clone)]
pub struct RangeScanner {
    dir: PathBuf,
    timeshift: Timeshift,
}

impl RangeScanner {
    /// Create a scanner over partition files in `dir`
    pub fn new(dir: impl Into<PathBuf>, timeshift: Timeshift) -> Self {
        Self {
            dir: dir.into(),
            timeshift,
        }
    }

    /// Sum of values for `key` with timestamps in `range`.
    ///
    /// Missing partitions count as zero. A partition that exists but cannot be
    /// opened or read fails the whole sum.
    pub fn sum(&self, key: MetricKey, range: TimeRange) -> Result<i64> {
        validate_key(key)?;
        if range.is_empty() {
            return Ok(0);
        }

        let candidates = self.candidates(key, range)?;
        debug!(
            key = %key,
            start = range.start,
            end = range.end,
            candidates = candidates.len(),
            "Scanning partitions"
        );

        let mut total = 0i64;
        for path in &candidates {
            total += self.sum_file(path, range)?;
        }
        Ok(total)
    }

    /// Paths of every partition for `key` whose bucket lies between the
    /// buckets of `range.start` and `range.end`, inclusive.
    fn candidates(&self, key: MetricKey, range: TimeRange) -> Result<Vec<PathBuf>> {
        let first = self.timeshift.index(range.start);
        let last = self.timeshift.index(range.end);
        let span = last as i128 - first as i128 + 1;

        if span > DIRECTORY_SCAN_THRESHOLD as i128 {
            return self.list_partitions(key, first, last);
        }

        Ok((first..=last)
            .map(|index| PartitionKey::from_index(key, index, self.timeshift).path_in(&self.dir))
            .collect())
    }

    /// List the data directory once instead of probing each bucket
    fn list_partitions(&self, key: MetricKey, first: i64, last: i64) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(partition) = PartitionKey::parse_file_name(name, self.timeshift) {
                if partition.key() == key && (first..=last).contains(&partition.index()) {
                    found.push(partition);
                }
            }
        }

        found.sort_by_key(|p| p.index());
        Ok(found.into_iter().map(|p| p.path_in(&self.dir)).collect())
    }

    fn sum_file(&self, path: &Path, range: TimeRange) -> Result<i64> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut total = 0i64;
        for record in RecordReader::new(file) {
            let record = record?;
            if range.contains(record.timestamp) {
                total += record.value as i64;
            }
        }
        Ok(total)
    }
}
