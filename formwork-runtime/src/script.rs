//! Functions rule actions can call.
//!
//! Storage functions queue an operation and return its id as a string;
//! they never wait for the result. `remove` stands in for `delete`, which
//! is reserved in JavaScript.

use crate::action::{ActionContext, ActionOutcome, ActionRegistry};
use formwork_eval::HostBindings;
use formwork_queue::{OperationKind, OperationQueue, OperationRequest};
use formwork_types::{Context, OperationId, Record, Value};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const STORAGE_FUNCTIONS: &[(&str, OperationKind, &[&str])] = &[
    ("save", OperationKind::Save, &["entity", "record"]),
    ("findById", OperationKind::FindById, &["entity", "id"]),
    ("findAll", OperationKind::FindAll, &["entity", "options"]),
    ("update", OperationKind::Update, &["entity", "id", "partial"]),
    ("remove", OperationKind::Delete, &["entity", "id"]),
];

/// Host bindings for one rule execution.
pub(crate) struct ScriptHost {
    queue: Arc<OperationQueue>,
    actions: Arc<ActionRegistry>,
    form: Context,
    outcome: Mutex<ActionOutcome>,
}

impl ScriptHost {
    pub(crate) fn new(
        queue: Arc<OperationQueue>,
        actions: Arc<ActionRegistry>,
        form: Context,
    ) -> Self {
        Self {
            queue,
            actions,
            form,
            outcome: Mutex::new(ActionOutcome::default()),
        }
    }

    /// What the actions run so far asked for.
    pub(crate) fn take_outcome(&self) -> ActionOutcome {
        std::mem::take(&mut *self.lock_outcome())
    }

    fn lock_outcome(&self) -> std::sync::MutexGuard<'_, ActionOutcome> {
        self.outcome.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn submit(&self, kind: OperationKind, params: &[&str], args: Vec<Value>) -> Result<Value, String> {
        let parts: Record = params
            .iter()
            .map(|name| name.to_string())
            .zip(args)
            .collect();
        let request = OperationRequest::from_parts(kind, &Value::Map(parts)).map_err(|e| e.to_string())?;
        let id = self.queue.submit(request).map_err(|e| e.to_string())?;
        self.lock_outcome().operations.push(id);
        Ok(Value::String(id.to_string()))
    }

    /// Runs a registered action with this execution's context as its form.
    fn run_action(&self, args: Vec<Value>) -> Result<Value, String> {
        let name = match args.first() {
            Some(Value::String(name)) => name.as_str(),
            _ => return Err("expected an action name".into()),
        };
        let action = self
            .actions
            .get(name)
            .ok_or_else(|| format!("action not found: {name}"))?;

        let mut ctx = ActionContext::new(name, &self.form, true, &self.queue);
        let result = action(&mut ctx);
        let ran = ctx.into_outcome();
        let ids = ids_value(&ran.operations);

        let mut outcome = self.lock_outcome();
        outcome.operations.extend(ran.operations);
        if ran.navigate_to.is_some() {
            outcome.navigate_to = ran.navigate_to;
        }
        drop(outcome);

        result.map_err(|e| format!("action '{name}' failed: {e:#}"))?;
        debug!(action = name, "Rule ran action");
        Ok(ids)
    }
}

impl HostBindings for ScriptHost {
    fn functions(&self) -> Vec<String> {
        STORAGE_FUNCTIONS
            .iter()
            .map(|(name, _, _)| *name)
            .chain(["log", "navigate", "runAction"])
            .map(str::to_string)
            .collect()
    }

    fn call(&self, function: &str, args: Vec<Value>) -> Result<Value, String> {
        if let Some((_, kind, params)) = STORAGE_FUNCTIONS.iter().find(|(name, _, _)| *name == function) {
            return self.submit(*kind, params, args);
        }
        match function {
            "log" => {
                let message: Vec<String> = args.iter().map(plain).collect();
                info!(source = "rule", "{}", message.join(" "));
                Ok(Value::Null)
            }
            "navigate" => match args.into_iter().next() {
                Some(Value::String(step)) => {
                    self.lock_outcome().navigate_to = Some(step);
                    Ok(Value::Null)
                }
                _ => Err("expected a step id".into()),
            },
            "runAction" => self.run_action(args),
            other => Err(format!("unknown function {other}")),
        }
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn ids_value(ids: &[OperationId]) -> Value {
    Value::List(ids.iter().map(|id| Value::String(id.to_string())).collect())
}
