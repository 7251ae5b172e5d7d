//! Per-key tracking of the most recently written partition

use crate::config::EVICTION_DISTANCE;
use crate::partition::PartitionKey;
use crate::MetricKey;
use dashmap::DashMap;

/// Remembers, per metric key, the partition of the last write.
///
/// Losing an entry only delays an eviction; it never loses data.
#[derive(Debug, Default)]
pub struct RecentPartitions {
    latest: DashMap<MetricKey, PartitionKey>,
}

impl RecentPartitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `partition` as the latest write for its key.
    ///
    /// Returns the previously tracked partition when `partition` is at least
    /// [`EVICTION_DISTANCE`] buckets ahead of it. Samples up to one full bucket
    /// late therefore never force a reopen.
    pub fn advance(&self, partition: PartitionKey) -> Option<PartitionKey> {
        let previous = self.latest.insert(partition.key(), partition)?;
        if partition.buckets_ahead_of(&previous) >= EVICTION_DISTANCE as i128 {
            Some(previous)
        } else {
            None
        }
    }

    /// Latest tracked partition for `key`
    pub fn get(&self, key: MetricKey) -> Option<PartitionKey> {
        self.latest.get(&key).map(|entry| *entry.value())
    }

    /// Forget every key
    pub fn clear(&self) {
        self.latest.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::Timeshift;

    fn partition(key: char, ts: i64) -> PartitionKey {
        PartitionKey::new(key, ts, Timeshift::new(60).unwrap())
    }

    #[test]
    fn test_first_write_evicts_nothing() {
        let tracker = RecentPartitions::new();
        assert_eq!(tracker.advance(partition('a', 0)), None);
        assert_eq!(tracker.get('a'), Some(partition('a', 0)));
    }

    #[test]
    fn test_one_bucket_ahead_keeps_previous() {
        let tracker = RecentPartitions::new();
        tracker.advance(partition('a', 0));
        assert_eq!(tracker.advance(partition('a', 60)), None);
        assert_eq!(tracker.advance(partition('a', 119)), None);
    }

    #[test]
    fn test_two_buckets_ahead_evicts_previous() {
        let tracker = RecentPartitions::new();
        tracker.advance(partition('a', 0));
        assert_eq!(tracker.advance(partition('a', 120)), Some(partition('a', 0)));
        assert_eq!(tracker.get('a'), Some(partition('a', 120)));
    }

    #[test]
    fn test_late_write_updates_tracking() {
        let tracker = RecentPartitions::new();
        tracker.advance(partition('a', 600));
        assert_eq!(tracker.advance(partition('a', 0)), None);
        assert_eq!(tracker.get('a'), Some(partition('a', 0)));
        assert_eq!(tracker.advance(partition('a', 660)), Some(partition('a', 0)));
    }

    #[test]
    fn test_keys_tracked_independently() {
        let tracker = RecentPartitions::new();
        tracker.advance(partition('a', 0));
        assert_eq!(tracker.advance(partition('b', 6000)), None);
        assert_eq!(tracker.get('a'), Some(partition('a', 0)));

        tracker.clear();
        assert_eq!(tracker.get('a'), None);
    }
}
