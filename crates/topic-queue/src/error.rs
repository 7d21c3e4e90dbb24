//! Queue error types.

use thiserror::Error;

/// Errors from queue and subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The topic was never created (or was deleted before the call).
    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    /// Non-blocking publish hit a topic whose buffer is at capacity.
    #[error("Topic buffer is full: {0}")]
    BufferFull(String),

    /// The topic was closed while the operation was waiting on it.
    #[error("Topic closed: {0}")]
    TopicClosed(String),

    /// The subscription's topic is gone and its buffer fully drained.
    #[error("Subscription closed")]
    Closed,

    /// The whole queue was shut down; no further operations succeed.
    #[error("Queue is closed")]
    QueueClosed,

    /// The caller's cancellation token fired before or during the call.
    #[error("Operation cancelled")]
    Cancelled,

    /// Rejected configuration value.
    #[error("Invalid topic capacity: {capacity} (must be non-zero)")]
    InvalidCapacity { capacity: usize },
}
