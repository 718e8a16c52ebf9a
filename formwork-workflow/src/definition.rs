use crate::error::{WorkflowError, WorkflowResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One step of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub label: String,

    /// Opaque screen token handed to the rendering layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_id: Option<String>,

    /// Candidate successors, highest priority first.
    #[serde(default)]
    pub next_steps: Vec<String>,

    /// Guard expression per candidate. A candidate without an entry is
    /// unconditional.
    #[serde(default)]
    pub conditions: BTreeMap<String, String>,
}

impl WorkflowStep {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            screen_id: None,
            next_steps: Vec::new(),
            conditions: BTreeMap::new(),
        }
    }

    pub fn with_screen(mut self, screen_id: impl Into<String>) -> Self {
        self.screen_id = Some(screen_id.into());
        self
    }

    /// Appends a candidate successor, optionally guarded.
    pub fn then(mut self, step: impl Into<String>, guard: Option<&str>) -> Self {
        let step = step.into();
        if let Some(guard) = guard {
            self.conditions.insert(step.clone(), guard.to_string());
        }
        self.next_steps.push(step);
        self
    }

    /// Terminal steps have no successors.
    pub fn is_terminal(&self) -> bool {
        self.next_steps.is_empty()
    }

    pub fn guard(&self, candidate: &str) -> Option<&str> {
        self.conditions.get(candidate).map(String::as_str)
    }
}

/// A complete workflow declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub label: String,

    pub initial_step: String,

    pub steps: BTreeMap<String, WorkflowStep>,
}

impl WorkflowDefinition {
    pub fn new(id: impl Into<String>, initial_step: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            initial_step: initial_step.into(),
            steps: BTreeMap::new(),
        }
    }

    pub fn with_step(mut self, step: WorkflowStep) -> Self {
        self.steps.insert(step.id.clone(), step);
        self
    }

    pub fn step(&self, id: &str) -> WorkflowResult<&WorkflowStep> {
        self.steps.get(id).ok_or_else(|| WorkflowError::StepNotFound {
            workflow: self.id.clone(),
            step: id.to_string(),
        })
    }

    /// Checks step-reference integrity.
    ///
    /// `initialStep`, every `nextSteps` entry and every guard key must name
    /// a declared step, guards must belong to a listed successor, and each
    /// step's `id` must match the key it is declared under.
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.steps.is_empty() {
            return Err(WorkflowError::InvalidDeclaration(format!(
                "workflow '{}' declares no steps",
                self.id
            )));
        }
        if !self.steps.contains_key(&self.initial_step) {
            return Err(WorkflowError::StepReference {
                workflow: self.id.clone(),
                from: "initialStep".into(),
                target: self.initial_step.clone(),
            });
        }

        for (key, step) in &self.steps {
            if step.id != *key {
                return Err(WorkflowError::InvalidDeclaration(format!(
                    "workflow '{}': step keyed '{key}' declares id '{}'",
                    self.id, step.id
                )));
            }
            for target in &step.next_steps {
                if !self.steps.contains_key(target) {
                    return Err(WorkflowError::StepReference {
                        workflow: self.id.clone(),
                        from: key.clone(),
                        target: target.clone(),
                    });
                }
            }
            if let Some(orphan) = step
                .conditions
                .keys()
                .find(|target| !step.next_steps.contains(target))
            {
                return Err(WorkflowError::InvalidDeclaration(format!(
                    "workflow '{}': step '{key}' guards '{orphan}', which is not one of its nextSteps",
                    self.id
                )));
            }
        }
        Ok(())
    }
}
