//! Error types for rule loading and execution.

use formwork_eval::EvalError;
use thiserror::Error;

/// Result type for rule operations.
pub type RuleResult<T> = Result<T, RuleError>;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule not found: {0}")]
    RuleNotFound(String),

    #[error("invalid rule declaration: {0}")]
    InvalidDeclaration(String),

    #[error("rule id '{0}' is declared more than once")]
    DuplicateRule(String),

    #[error("action of rule '{rule}' failed: {source}")]
    Evaluation {
        rule: String,
        #[source]
        source: EvalError,
    },
}

impl From<serde_json::Error> for RuleError {
    fn from(e: serde_json::Error) -> Self {
        RuleError::InvalidDeclaration(e.to_string())
    }
}
