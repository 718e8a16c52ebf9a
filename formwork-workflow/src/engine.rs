use crate::definition::WorkflowDefinition;
use crate::error::{WorkflowError, WorkflowResult};
use crate::session::WorkflowSession;
use formwork_eval::{evaluate_condition, ExpressionEvaluator};
use formwork_types::Context;
use std::sync::Arc;
use tracing::debug;

/// Resolves transitions by evaluating step guards.
#[derive(Clone)]
pub struct WorkflowEngine {
    evaluator: Arc<dyn ExpressionEvaluator>,
}

impl WorkflowEngine {
    pub fn new(evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        Self { evaluator }
    }

    /// Picks the step that follows `current`.
    ///
    /// Candidates are tried in `nextSteps` order. The first one without a
    /// guard, or whose guard evaluates to literal `true`, wins. A terminal
    /// step, or one where every guard fails, yields `InvalidTransition`.
    pub fn advance(
        &self,
        workflow: &WorkflowDefinition,
        current: &str,
        context: &Context,
    ) -> WorkflowResult<String> {
        let step = workflow.step(current)?;
        for candidate in &step.next_steps {
            let open = match step.guard(candidate) {
                None => true,
                Some(guard) => evaluate_condition(self.evaluator.as_ref(), guard, context),
            };
            if open {
                debug!(workflow = %workflow.id, from = current, to = %candidate, "Transition selected");
                return Ok(candidate.clone());
            }
        }
        Err(WorkflowError::InvalidTransition {
            workflow: workflow.id.clone(),
            step: current.to_string(),
        })
    }

    /// Starts a run at the workflow's initial step.
    pub fn start(&self, workflow: Arc<WorkflowDefinition>) -> WorkflowSession {
        WorkflowSession::new(workflow)
    }
}
