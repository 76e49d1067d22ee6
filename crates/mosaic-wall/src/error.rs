//! Error types for the wall daemon.

use thiserror::Error;

/// Result type for wall operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the wall daemon.
#[derive(Debug, Error)]
pub enum Error {
    /// Fetching or parsing the pledge export failed.
    #[error("sync error: {0}")]
    Sync(#[from] mosaic_sync::SyncError),

    /// The export carried an invalid pledge record.
    #[error("invalid pledge record: {0}")]
    Record(#[from] mosaic_patron::RecordError),

    /// The allocation invariants were violated. This is an implementation
    /// bug and aborts the run.
    #[error("allocation error: {0}")]
    Allocation(#[from] mosaic_allocation::AllocationError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}
