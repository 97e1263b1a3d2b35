//! Error types for queue storage.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while persisting or loading queued mutations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error on the durable medium.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The journal contents are unreadable.
    #[error("journal corrupted: {0}")]
    Corrupted(String),
}
