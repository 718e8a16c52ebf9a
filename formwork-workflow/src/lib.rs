//! Declared multi-step workflows.
//!
//! A workflow is a finite-state machine over its steps. Definitions are
//! validated when loaded, so a dangling step reference never reaches run
//! time. Transitions try each of a step's `nextSteps` in order and take the
//! first one whose guard holds.

mod definition;
mod engine;
mod error;
mod registry;
mod session;

pub use definition::{WorkflowDefinition, WorkflowStep};
pub use engine::WorkflowEngine;
pub use error::{WorkflowError, WorkflowResult};
pub use registry::WorkflowRegistry;
pub use session::WorkflowSession;
