//! Error types for the replay engine.

use outbox_queue::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while replaying queued mutations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network or transport failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the replay can be retried.
        retryable: bool,
    },

    /// A replay call exceeded its timeout.
    #[error("replay timed out")]
    Timeout,

    /// The server returned a definitive rejection during replay.
    #[error("server rejected replay with status {status}: {message}")]
    Rejected {
        /// HTTP status of the rejection.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The durable queue failed.
    #[error("queue store error: {0}")]
    Store(#[from] StoreError),

    /// The sync pass was cancelled.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if the failure is transient and worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Timeout => true,
            _ => false,
        }
    }
}
