//! Error types for MetricDB

use thiserror::Error;

/// Result type alias for MetricDB operations
pub type Result<T> = std::result::Result<T, MetricError>;

/// MetricDB error types
#[derive(Error, Debug)]
pub enum MetricError {
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metric key cannot be used to name a partition file
    #[error("Invalid metric key: {0}")]
    InvalidKey(String),
}

impl MetricError {
    /// Check if error came from the filesystem
    pub fn is_io(&self) -> bool {
        matches!(self, MetricError::Io(_))
    }
}
