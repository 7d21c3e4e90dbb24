//! Store error types.

use thiserror::Error;

/// Errors from keyed-store operations.
///
/// Sentinel-style on purpose: callers match on the kind, the surrounding
/// log line carries the key and collection.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Read, update, or delete on a key that was never created.
    #[error("Record not found")]
    NotFound,

    /// Create on a key that already exists. The stored value is left
    /// untouched.
    #[error("Record already exists")]
    DuplicateConstraint,

    /// The caller's cancellation token fired before or during the call.
    #[error("Operation cancelled")]
    Cancelled,
}
