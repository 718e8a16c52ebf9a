//! Host-registered actions.
//!
//! An action is a named callable the host invokes, typically from a form
//! button. It sees the form values collected so far and may navigate,
//! log, and submit storage work to the operation queue.

use formwork_queue::{OperationQueue, OperationRequest, QueueResult};
use formwork_storage::QueryOptions;
use formwork_types::{Context, OperationId, Record, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

type ActionFn = dyn Fn(&mut ActionContext<'_>) -> anyhow::Result<()> + Send + Sync;

/// Named actions available to [`Runtime::run_action`](crate::Runtime::run_action).
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<ActionFn>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `action` under `name`, replacing any previous action with
    /// that name.
    pub fn register<F>(&mut self, name: impl Into<String>, action: F)
    where
        F: Fn(&mut ActionContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(action = %name, "Registered action");
        self.actions.insert(name, Arc::new(action));
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.actions.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<ActionFn>> {
        self.actions.get(name).cloned()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

/// What an action asked for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutcome {
    /// Step requested through [`ActionContext::navigate`]; the last request
    /// wins.
    pub navigate_to: Option<String>,
    /// Operations submitted, in submission order.
    pub operations: Vec<OperationId>,
}

/// Execution context handed to an action.
pub struct ActionContext<'a> {
    name: &'a str,
    form: &'a Context,
    valid: bool,
    queue: &'a OperationQueue,
    outcome: ActionOutcome,
}

impl<'a> ActionContext<'a> {
    pub(crate) fn new(
        name: &'a str,
        form: &'a Context,
        valid: bool,
        queue: &'a OperationQueue,
    ) -> Self {
        Self {
            name,
            form,
            valid,
            queue,
            outcome: ActionOutcome::default(),
        }
    }

    pub fn action_name(&self) -> &str {
        self.name
    }

    /// Form values accumulated by the caller.
    pub fn form_values(&self) -> &Context {
        self.form
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.form.get(key)
    }

    /// Whether the caller considered the form valid.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn navigate(&mut self, step: impl Into<String>) {
        self.outcome.navigate_to = Some(step.into());
    }

    pub fn log(&self, message: &str) {
        info!(action = self.name, "{message}");
    }

    // ── Storage primitives ───────────────────────────────────────
    //
    // Each returns as soon as the operation is queued; poll the id for the
    // result.

    pub fn submit(&mut self, request: OperationRequest) -> QueueResult<OperationId> {
        let id = self.queue.submit(request)?;
        self.outcome.operations.push(id);
        Ok(id)
    }

    pub fn save(&mut self, entity: &str, record: Record) -> QueueResult<OperationId> {
        self.submit(OperationRequest::Save {
            entity: entity.to_string(),
            record,
        })
    }

    pub fn find_by_id(&mut self, entity: &str, id: impl Into<Value>) -> QueueResult<OperationId> {
        self.submit(OperationRequest::FindById {
            entity: entity.to_string(),
            id: id.into(),
        })
    }

    pub fn find_all(&mut self, entity: &str, options: QueryOptions) -> QueueResult<OperationId> {
        self.submit(OperationRequest::FindAll {
            entity: entity.to_string(),
            options,
        })
    }

    pub fn update(
        &mut self,
        entity: &str,
        id: impl Into<Value>,
        partial: Record,
    ) -> QueueResult<OperationId> {
        self.submit(OperationRequest::Update {
            entity: entity.to_string(),
            id: id.into(),
            partial,
        })
    }

    pub fn delete(&mut self, entity: &str, id: impl Into<Value>) -> QueueResult<OperationId> {
        self.submit(OperationRequest::Delete {
            entity: entity.to_string(),
            id: id.into(),
        })
    }

    pub(crate) fn into_outcome(self) -> ActionOutcome {
        self.outcome
    }
}
