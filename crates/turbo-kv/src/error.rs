//! Store error types.

use thiserror::Error;

/// Errors that can occur when talking to the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Operation against a key holding the wrong kind of value.
    #[error("WRONGTYPE operation against key holding the wrong kind of value: {key}")]
    WrongType { key: String },

    /// Rename source does not exist.
    #[error("No such key: {0}")]
    NoSuchKey(String),

    /// Increment against a value that is not an integer.
    #[error("Value at {key} is not an integer or out of range")]
    NotAnInteger { key: String },

    /// Backend returned a reply of an unexpected shape.
    #[error("Unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply { expected: &'static str, got: String },

    /// Batch returned a different number of replies than commands sent.
    #[error("Batch reply count mismatch: sent {sent}, received {received}")]
    ReplyCount { sent: usize, received: usize },

    /// Failure inside a backend adapter (connection, protocol, ...).
    #[error("Store operation failed: {0}")]
    Backend(String),
}
