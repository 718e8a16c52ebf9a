use crate::definition::{WorkflowDefinition, WorkflowStep};
use crate::engine::WorkflowEngine;
use crate::error::WorkflowResult;
use formwork_types::Context;
use std::sync::Arc;

/// The position of one run through a workflow.
///
/// A session keeps the definition it started with, so reloading the
/// registry does not affect runs already in progress.
#[derive(Debug, Clone)]
pub struct WorkflowSession {
    workflow: Arc<WorkflowDefinition>,
    current: String,
    history: Vec<String>,
}

impl WorkflowSession {
    pub fn new(workflow: Arc<WorkflowDefinition>) -> Self {
        let current = workflow.initial_step.clone();
        Self {
            workflow,
            current,
            history: Vec::new(),
        }
    }

    /// Resumes a run at a previously persisted step.
    pub fn resume(workflow: Arc<WorkflowDefinition>, step: &str) -> WorkflowResult<Self> {
        workflow.step(step)?;
        Ok(Self {
            current: step.to_string(),
            workflow,
            history: Vec::new(),
        })
    }

    pub fn workflow(&self) -> &Arc<WorkflowDefinition> {
        &self.workflow
    }

    pub fn current_id(&self) -> &str {
        &self.current
    }

    pub fn current_step(&self) -> WorkflowResult<&WorkflowStep> {
        self.workflow.step(&self.current)
    }

    pub fn screen_id(&self) -> Option<&str> {
        self.current_step().ok()?.screen_id.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.current_step().map(WorkflowStep::is_terminal).unwrap_or(false)
    }

    /// Steps visited before the current one, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Moves to the next step. On error the session stays where it was.
    pub fn advance(&mut self, engine: &WorkflowEngine, context: &Context) -> WorkflowResult<&str> {
        let next = engine.advance(&self.workflow, &self.current, context)?;
        let previous = std::mem::replace(&mut self.current, next);
        self.history.push(previous);
        Ok(&self.current)
    }

    /// Returns to the previous step, if any.
    pub fn back(&mut self) -> Option<&str> {
        let previous = self.history.pop()?;
        self.current = previous;
        Some(&self.current)
    }
}
