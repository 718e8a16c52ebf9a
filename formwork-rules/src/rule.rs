use formwork_types::Context;
use serde::{Deserialize, Serialize};

/// A single condition/action rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique across every rule set of a book.
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Satisfied when it evaluates to literal `true`. Absent means always.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Evaluated for effect on execution. Absent means no-op.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Literal values layered over the caller's context before the action
    /// runs. These win on key collision.
    #[serde(default, skip_serializing_if = "Context::is_empty")]
    pub params: Context,
}

impl Rule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            condition: None,
            action: None,
            params: Context::new(),
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<formwork_types::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// The context the action runs against: `context` overlaid with params.
    pub fn action_context(&self, context: &Context) -> Context {
        let mut merged = context.clone();
        merged.extend(self.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}
