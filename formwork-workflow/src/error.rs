//! Error types for workflow loading and transitions.

use thiserror::Error;

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// A declared reference points at a step the workflow does not define.
    #[error("workflow '{workflow}': step '{from}' references undeclared step '{target}'")]
    StepReference {
        workflow: String,
        from: String,
        target: String,
    },

    /// No candidate next step had a satisfied guard.
    #[error("workflow '{workflow}': no transition available from step '{step}'")]
    InvalidTransition { workflow: String, step: String },

    #[error("workflow '{workflow}' has no step '{step}'")]
    StepNotFound { workflow: String, step: String },

    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("invalid workflow declaration: {0}")]
    InvalidDeclaration(String),
}

impl From<serde_json::Error> for WorkflowError {
    fn from(e: serde_json::Error) -> Self {
        WorkflowError::InvalidDeclaration(e.to_string())
    }
}
