//! Error types for fetch and parse.

use thiserror::Error;

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while syncing the pledge export.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Downloading the export failed.
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Reading or writing the snapshot cache failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The export body did not carry a usable data payload.
    #[error("malformed export payload: {0}")]
    Payload(String),
}
