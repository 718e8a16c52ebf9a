//! The embeddable Formwork runtime.
//!
//! [`Runtime`] ties the pieces together: schema declarations drive the
//! storage tables, rule and workflow declarations are evaluated through a
//! shared expression evaluator, and host-registered actions submit storage
//! work through the operation queue. Rule actions reach the same storage
//! functions, plus `log`, `navigate` and `runAction`, as script globals.

mod action;
mod config;
mod error;
mod logging;
mod runtime;
mod script;

pub use action::{ActionContext, ActionOutcome, ActionRegistry};
pub use config::{DatabaseConfig, DeclarationPaths, LoggingConfig, RuntimeConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::init_logging;
pub use runtime::Runtime;

// Re-exported so hosts can depend on this crate alone.
pub use formwork_eval::{EvaluatorConfig, ExpressionEvaluator, JsEvaluator};
pub use formwork_queue::{OperationKind, OperationRequest, OperationStatus};
pub use formwork_rules::ExecutionReport;
pub use formwork_storage::{Direction, Operator, QueryOptions};
pub use formwork_types::{Context, OperationId, Record, Value};
pub use formwork_workflow::WorkflowSession;
