//! Operation queue for Formwork.
//!
//! Callers that must not block (action scripts, UI callbacks) submit
//! storage work and get an [`OperationId`] back immediately. A single
//! worker task drains submissions in strict FIFO order against the
//! [`StorageEngine`]; results are retrieved later by polling.
//!
//! Ordering within one queue is the only cross-operation guarantee. There
//! is no priority, no cancellation of accepted work and no timeout.
//!
//! [`OperationId`]: formwork_types::OperationId
//! [`StorageEngine`]: formwork_storage::StorageEngine

mod error;
mod operation;
mod queue;

pub use error::{QueueError, QueueResult};
pub use operation::{OperationKind, OperationRequest, OperationStatus};
pub use queue::OperationQueue;
