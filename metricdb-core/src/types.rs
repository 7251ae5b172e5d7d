//! Core types for MetricDB

use crate::{MetricError, Result};
use std::fmt;

/// Timestamp in milliseconds, assigned by the caller
pub type Timestamp = i64;

/// Single-character metric name
pub type MetricKey = char;

/// A single metric sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Timestamp in milliseconds
    pub timestamp: Timestamp,
    /// Metric name
    pub key: MetricKey,
    /// Sample value
    pub value: i32,
}

impl Sample {
    /// Create a new sample
    pub fn new(timestamp: Timestamp, key: MetricKey, value: i32) -> Self {
        Self {
            timestamp,
            key,
            value,
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}={}", self.key, self.timestamp, self.value)
    }
}

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// Start timestamp (inclusive)
    pub start: Timestamp,
    /// End timestamp (exclusive)
    pub end: Timestamp,
}

impl TimeRange {
    /// Create a new time range
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Check if a timestamp is within the range
    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts < self.end
    }

    /// True when no timestamp can fall inside the range
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Reject keys that cannot appear in a partition file name.
pub fn validate_key(key: MetricKey) -> Result<()> {
    if key == '/' || key == '\\' || key == '\0' || key == std::path::MAIN_SEPARATOR {
        return Err(MetricError::InvalidKey(format!("{:?}", key)));
    }
    Ok(())
}
