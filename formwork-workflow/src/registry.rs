//! Loading workflow declarations.

use crate::definition::WorkflowDefinition;
use crate::error::{WorkflowError, WorkflowResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Validated workflow definitions, keyed by id.
#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    workflows: HashMap<String, Arc<WorkflowDefinition>>,
    order: Vec<String>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a mapping of workflow id to definition. Any invalid workflow
    /// fails the whole load.
    pub fn load(raw: &str) -> WorkflowResult<Self> {
        let doc: serde_json::Value = serde_json::from_str(raw)?;
        Self::load_value(doc)
    }

    pub fn load_value(doc: serde_json::Value) -> WorkflowResult<Self> {
        let serde_json::Value::Object(entries) = doc else {
            return Err(WorkflowError::InvalidDeclaration(
                "workflow document must be an object keyed by workflow id".into(),
            ));
        };

        let mut definitions = Vec::with_capacity(entries.len());
        for (key, body) in entries {
            let mut definition: WorkflowDefinition = serde_json::from_value(body)
                .map_err(|e| WorkflowError::InvalidDeclaration(format!("workflow '{key}': {e}")))?;
            if definition.id.is_empty() {
                definition.id = key.clone();
            } else if definition.id != key {
                return Err(WorkflowError::InvalidDeclaration(format!(
                    "workflow keyed '{key}' declares id '{}'",
                    definition.id
                )));
            }
            for (step_key, step) in definition.steps.iter_mut() {
                if step.id.is_empty() {
                    step.id = step_key.clone();
                }
            }
            definitions.push(definition);
        }

        let registry = Self::from_definitions(definitions)?;
        info!(workflows = registry.len(), "Loaded workflows");
        Ok(registry)
    }

    /// Validates and indexes typed definitions.
    pub fn from_definitions(definitions: Vec<WorkflowDefinition>) -> WorkflowResult<Self> {
        let mut registry = Self::new();
        for definition in definitions {
            definition.validate()?;
            if registry.workflows.contains_key(&definition.id) {
                return Err(WorkflowError::InvalidDeclaration(format!(
                    "workflow '{}' is declared more than once",
                    definition.id
                )));
            }
            registry.order.push(definition.id.clone());
            registry
                .workflows
                .insert(definition.id.clone(), Arc::new(definition));
        }
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> WorkflowResult<Arc<WorkflowDefinition>> {
        self.workflows
            .get(id)
            .cloned()
            .ok_or_else(|| WorkflowError::WorkflowNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.workflows.contains_key(id)
    }

    /// Definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<WorkflowDefinition>> {
        self.order.iter().filter_map(move |id| self.workflows.get(id))
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}
