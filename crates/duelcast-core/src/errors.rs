//! Error taxonomy for a single connection's lifetime.
//!
//! Every variant here is fatal to the connection that raised it and to
//! nothing else: the pump that sees it unregisters and closes the transport.

use std::time::Duration;

/// A move-store call failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The underlying database rejected the operation.
    #[error("database error: {0}")]
    Database(String),
    /// No round exists for the given key.
    #[error("not found: {0}")]
    NotFound(String),
    /// Filesystem failure while opening the store.
    #[error("IO error: {0}")]
    Io(String),
    /// The blocking task running the call panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(String),
}

/// An inbound frame could not be turned into a move request.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Frame exceeded the configured read limit.
    #[error("message of {size} bytes exceeds limit of {limit}")]
    TooLarge {
        /// Size of the offending frame in bytes.
        size: usize,
        /// Configured maximum.
        limit: usize,
    },
    /// Binary frame payload was not UTF-8.
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,
    /// Payload was not a JSON move request.
    #[error("invalid move request: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reading from or writing to the WebSocket failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A read or write deadline expired.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Socket-level failure.
    #[error("socket error: {0}")]
    Socket(String),
}
