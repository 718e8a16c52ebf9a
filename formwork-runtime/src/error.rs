//! Error types for the runtime facade.

use formwork_queue::QueueError;
use formwork_rules::RuleError;
use formwork_schema::SchemaError;
use formwork_storage::StorageError;
use formwork_workflow::WorkflowError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("action not found: {0}")]
    ActionNotFound(String),

    #[error("action '{name}' failed: {source}")]
    Action {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}
