//! MetricDB Core - Time-Partitioned Metric Store
//!
//! An append-only store for numeric samples keyed by a single-character
//! metric name, answering range-sum queries over half-open time intervals.
//!
//! # Architecture
//!
//! - **Partitions**: one file per (key, time bucket), named `<key>-<bucket>`
//! - **Records**: fixed 12-byte `(timestamp, value)` tuples appended back to back
//! - **Handle cache**: open append handles reused across writes and evicted
//!   once a key's writes move two buckets ahead
//! - **Range scanner**: probes the partition files covering an interval and
//!   sums the matching records
//!
//! ```no_run
//! use metricdb_core::storage::MetricStore;
//!
//! let store = MetricStore::open("/tmp/metrics", 60_000)?;
//! store.add(1_000, 'a', 5);
//! assert_eq!(store.sum(0, 60_000, 'a')?, 5);
//! store.close();
//! # Ok::<(), metricdb_core::MetricError>(())
//! ```

pub mod cache;
pub mod partition;
pub mod record;
pub mod storage;

mod error;
mod types;

pub use error::{MetricError, Result};
pub use types::*;

/// MetricDB version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod config {
    /// Default partition width (1 minute)
    pub const DEFAULT_TIMESHIFT_MS: i64 = 60_000;

    /// Default data directory
    pub const DEFAULT_DATA_DIR: &str = "data";

    /// Buckets a key must advance before its previous partition is closed
    pub const EVICTION_DISTANCE: i64 = 2;

    /// Above this many candidate buckets a range scan lists the directory
    /// instead of probing every file name
    pub const DIRECTORY_SCAN_THRESHOLD: usize = 4096;

    /// Environment variable overriding the data directory
    pub const DATA_DIR_ENV: &str = "METRICDB_DATA_DIR";

    /// Environment variable overriding the partition width in milliseconds
    pub const TIMESHIFT_ENV: &str = "METRICDB_PARTITION_TIMESHIFT";
}
