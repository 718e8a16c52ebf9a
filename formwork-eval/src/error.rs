//! Error types for expression evaluation.

use thiserror::Error;

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors raised while evaluating an expression.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    /// Syntax error, thrown exception, reference to an undefined name, or
    /// an exceeded runtime limit.
    #[error("expression failed: {0}")]
    Execution(String),

    /// Expression source exceeds the configured size cap.
    #[error("expression too large: {actual} bytes (max {max})")]
    ExpressionTooLarge { max: usize, actual: usize },

    /// The context could not be installed into the evaluator scope.
    #[error("failed to prepare evaluation scope: {0}")]
    Setup(String),
}
