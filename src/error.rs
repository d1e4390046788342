//! Common error types for citesync

use thiserror::Error;

/// Common result type for citesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error conditions; per-record lookup and patch problems are
/// reported through the run summary instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted store is structurally invalid
    #[error("Store parse error: {0}")]
    StoreParse(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source document missing or unreadable
    #[error("Document error: {0}")]
    Document(String),
}
