//! Error types for bookmarker-store

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store constructed with no workspace roots
    #[error("No workspace folder open")]
    NoWorkspace,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Imported file does not carry a `bookmarks` array
    #[error("Invalid bookmark file format")]
    InvalidFormat,
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
