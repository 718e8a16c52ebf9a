use serde::{Deserialize, Serialize};

/// Resource limits applied to every evaluation.
///
/// Limits are counted by the engine (loop iterations, call depth), not by
/// wall clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Max expression source length (bytes).
    pub max_expression_length: usize,
    /// Max iterations of any single loop.
    pub loop_iteration_limit: u64,
    /// Max function call depth.
    pub recursion_limit: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_expression_length: 64 * 1024,
            loop_iteration_limit: 1_000_000,
            recursion_limit: 256,
        }
    }
}
