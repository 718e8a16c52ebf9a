//! The runtime facade.

use crate::action::{ActionContext, ActionOutcome, ActionRegistry};
use crate::config::{DeclarationPaths, RuntimeConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::script::ScriptHost;
use formwork_eval::{ExpressionEvaluator, JsEvaluator};
use formwork_queue::{OperationQueue, OperationStatus};
use formwork_rules::{ExecutionReport, RuleBook, RuleEngine};
use formwork_schema::SchemaRegistry;
use formwork_storage::StorageEngine;
use formwork_types::{Context, OperationId};
use formwork_workflow::{WorkflowEngine, WorkflowRegistry, WorkflowSession};
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// One embedded application instance.
///
/// Declarations are swapped wholesale: a reload builds and validates the
/// new registry first, so a failing load leaves the previous one in place.
/// Work already holding a snapshot keeps using it.
pub struct Runtime {
    storage: Arc<StorageEngine>,
    queue: Arc<OperationQueue>,
    evaluator: Arc<dyn ExpressionEvaluator>,
    rules: RwLock<Arc<RuleBook>>,
    workflows: RwLock<Arc<WorkflowRegistry>>,
    actions: RwLock<Arc<ActionRegistry>>,
}

impl Runtime {
    /// Opens storage, starts the operation queue and loads the configured
    /// declaration files. Must be called from within a Tokio runtime.
    pub fn open(config: &RuntimeConfig) -> RuntimeResult<Self> {
        let evaluator = Arc::new(JsEvaluator::new(config.evaluator.clone()));
        Self::with_evaluator(config, evaluator)
    }

    /// Like [`open`](Self::open) with a caller-supplied evaluator.
    pub fn with_evaluator(
        config: &RuntimeConfig,
        evaluator: Arc<dyn ExpressionEvaluator>,
    ) -> RuntimeResult<Self> {
        let storage = match &config.database.path {
            Some(path) => StorageEngine::open(path)?,
            None => StorageEngine::open_in_memory()?,
        };
        let storage = Arc::new(storage);
        let runtime = Self {
            queue: Arc::new(OperationQueue::spawn(Arc::clone(&storage))),
            storage,
            evaluator,
            rules: RwLock::new(Arc::new(RuleBook::new())),
            workflows: RwLock::new(Arc::new(WorkflowRegistry::new())),
            actions: RwLock::new(Arc::new(ActionRegistry::new())),
        };
        runtime.load_declarations(&config.declarations)?;
        info!("Runtime ready");
        Ok(runtime)
    }

    // ── Declarations ─────────────────────────────────────────────

    /// Loads every configured declaration file, schemas first.
    pub fn load_declarations(&self, paths: &DeclarationPaths) -> RuntimeResult<()> {
        if let Some(path) = &paths.schemas {
            self.load_schemas(&read(path)?)?;
        }
        if let Some(path) = &paths.rules {
            self.load_rules(&read(path)?)?;
        }
        if let Some(path) = &paths.workflows {
            self.load_workflows(&read(path)?)?;
        }
        Ok(())
    }

    /// Replaces the schema registry and creates any missing tables.
    pub fn load_schemas(&self, raw: &str) -> RuntimeResult<()> {
        let registry = SchemaRegistry::load(raw)?;
        for schema in registry.iter() {
            self.storage.ensure_table(schema)?;
        }
        self.storage.set_registry(Arc::new(registry));
        Ok(())
    }

    pub fn load_rules(&self, raw: &str) -> RuntimeResult<()> {
        let book = RuleBook::load(raw)?;
        replace(&self.rules, Arc::new(book));
        Ok(())
    }

    pub fn load_workflows(&self, raw: &str) -> RuntimeResult<()> {
        let registry = WorkflowRegistry::load(raw)?;
        replace(&self.workflows, Arc::new(registry));
        Ok(())
    }

    pub fn schemas(&self) -> Arc<SchemaRegistry> {
        self.storage.registry()
    }

    pub fn workflows(&self) -> Arc<WorkflowRegistry> {
        snapshot(&self.workflows)
    }

    /// A rule engine over the current rule book.
    pub fn rules(&self) -> RuleEngine {
        RuleEngine::new(snapshot(&self.rules), Arc::clone(&self.evaluator))
    }

    pub fn workflow_engine(&self) -> WorkflowEngine {
        WorkflowEngine::new(Arc::clone(&self.evaluator))
    }

    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    pub fn queue(&self) -> &OperationQueue {
        &self.queue
    }

    // ── Rules ────────────────────────────────────────────────────

    pub fn evaluate_rule(&self, rule_id: &str, context: &Context) -> bool {
        self.rules().evaluate_rule(rule_id, context)
    }

    /// Runs a rule's action with the script functions bound and returns
    /// what it asked for.
    ///
    /// Operations queued before a failure stay queued.
    pub fn execute_rule(&self, rule_id: &str, context: &Context) -> RuntimeResult<ActionOutcome> {
        let host = self.script_host(context);
        self.rules()
            .with_host(host.clone())
            .execute_rule(rule_id, context)?;
        Ok(host.take_outcome())
    }

    pub fn evaluate_rules(&self, context: &Context) -> Vec<String> {
        self.rules().evaluate_rules(context)
    }

    pub fn evaluate_set(&self, set: &str, context: &Context) -> Vec<String> {
        self.rules().evaluate_set(set, context)
    }

    /// Executes every matching rule. The outcome collects what all of
    /// their actions asked for, failed ones included.
    pub fn execute_matching_rules(&self, context: &Context) -> (ExecutionReport, ActionOutcome) {
        let host = self.script_host(context);
        let report = self
            .rules()
            .with_host(host.clone())
            .execute_matching_rules(context);
        (report, host.take_outcome())
    }

    fn script_host(&self, context: &Context) -> Arc<ScriptHost> {
        Arc::new(ScriptHost::new(
            Arc::clone(&self.queue),
            snapshot(&self.actions),
            context.clone(),
        ))
    }

    // ── Workflows ────────────────────────────────────────────────

    pub fn start_workflow(&self, workflow_id: &str) -> RuntimeResult<WorkflowSession> {
        let workflow = self.workflows().get(workflow_id)?;
        debug!(workflow = workflow_id, step = %workflow.initial_step, "Workflow started");
        Ok(WorkflowSession::new(workflow))
    }

    /// Advances `session` and returns the step it moved to.
    pub fn advance(&self, session: &mut WorkflowSession, context: &Context) -> RuntimeResult<String> {
        let engine = self.workflow_engine();
        Ok(session.advance(&engine, context)?.to_string())
    }

    // ── Actions ──────────────────────────────────────────────────

    pub fn register_action<F>(&self, name: impl Into<String>, action: F)
    where
        F: Fn(&mut ActionContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut actions = self.actions.write().unwrap_or_else(|p| p.into_inner());
        Arc::make_mut(&mut *actions).register(name, action);
    }

    pub fn has_action(&self, name: &str) -> bool {
        let actions = self.actions.read().unwrap_or_else(|p| p.into_inner());
        actions.contains(name)
    }

    /// Invokes a registered action with the caller's form state.
    ///
    /// Operations the action queued before failing stay queued.
    pub fn run_action(&self, name: &str, form: &Context, valid: bool) -> RuntimeResult<ActionOutcome> {
        let action = snapshot(&self.actions)
            .get(name)
            .ok_or_else(|| RuntimeError::ActionNotFound(name.to_string()))?;

        let mut ctx = ActionContext::new(name, form, valid, &self.queue);
        action(&mut ctx).map_err(|source| RuntimeError::Action {
            name: name.to_string(),
            source,
        })?;
        let outcome = ctx.into_outcome();
        debug!(
            action = name,
            operations = outcome.operations.len(),
            navigate_to = ?outcome.navigate_to,
            "Action finished"
        );
        Ok(outcome)
    }

    // ── Operations ───────────────────────────────────────────────

    pub fn poll(&self, id: OperationId) -> RuntimeResult<OperationStatus> {
        Ok(self.queue.poll(id)?)
    }

    pub async fn wait(&self, id: OperationId) -> RuntimeResult<OperationStatus> {
        Ok(self.queue.wait(id).await?)
    }

    /// Drains queued operations and stops the worker.
    pub async fn shutdown(self) {
        match Arc::try_unwrap(self.queue) {
            Ok(queue) => queue.shutdown().await,
            Err(_) => warn!("Operation queue still shared, leaving it running"),
        }
        info!("Runtime stopped");
    }
}

fn read(path: &Path) -> RuntimeResult<String> {
    std::fs::read_to_string(path).map_err(|source| RuntimeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn snapshot<T>(lock: &RwLock<Arc<T>>) -> Arc<T> {
    match lock.read() {
        Ok(guard) => Arc::clone(&guard),
        Err(poisoned) => Arc::clone(&poisoned.into_inner()),
    }
}

fn replace<T>(lock: &RwLock<Arc<T>>, value: Arc<T>) {
    match lock.write() {
        Ok(mut guard) => *guard = value,
        Err(poisoned) => *poisoned.into_inner() = value,
    }
}
