use crate::error::EvalResult;
use crate::host::HostBindings;
use formwork_types::{Context, Value};
use std::sync::Arc;
use tracing::debug;

/// Evaluates an expression string against a variable scope.
///
/// Implementations need not be re-entrant; callers serialize through the
/// implementation's own locking.
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str, context: &Context) -> EvalResult<Value>;

    /// Like [`evaluate`](Self::evaluate), with `host`'s functions callable
    /// from the expression.
    fn evaluate_with_host(
        &self,
        expression: &str,
        context: &Context,
        host: Arc<dyn HostBindings>,
    ) -> EvalResult<Value>;
}

/// The boolean contract shared by rule conditions and workflow guards.
///
/// Only a literal `true` result counts. Any other value, and any
/// evaluation error, is false.
pub fn evaluate_condition(
    evaluator: &dyn ExpressionEvaluator,
    expression: &str,
    context: &Context,
) -> bool {
    match evaluator.evaluate(expression, context) {
        Ok(Value::Bool(true)) => true,
        Ok(other) => {
            debug!(expression, result = %other, "Condition not satisfied");
            false
        }
        Err(e) => {
            debug!(expression, "Condition evaluation failed, treating as false: {e}");
            false
        }
    }
}
