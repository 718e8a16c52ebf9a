//! Error types for the operation queue.

use formwork_types::OperationId;
use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors that can occur when submitting or polling operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The id was never submitted to this queue (or was discarded).
    #[error("unknown operation: {0}")]
    UnknownOperation(OperationId),

    /// Loosely-typed submission arguments could not be interpreted.
    #[error("invalid operation request: {0}")]
    InvalidRequest(String),

    /// The worker has shut down.
    #[error("operation queue closed")]
    Closed,
}
