//! Expression evaluation for Formwork rules and workflow guards.
//!
//! The core treats the evaluator as an opaque capability behind
//! [`ExpressionEvaluator`]: evaluate an expression string against a
//! [`Context`] and return a [`Value`] or an [`EvalError`].
//!
//! [`JsEvaluator`] is the bundled implementation, built on boa. Context
//! values are marshalled into the JS realm as native objects, never as
//! generated source text. Rule actions additionally see the functions of a
//! [`HostBindings`] implementation.
//!
//! [`Context`]: formwork_types::Context
//! [`Value`]: formwork_types::Value

mod bridge;
mod config;
mod error;
mod evaluator;
mod host;
mod js;

pub use config::EvaluatorConfig;
pub use error::{EvalError, EvalResult};
pub use evaluator::{evaluate_condition, ExpressionEvaluator};
pub use host::HostBindings;
pub use js::{JsEvaluator, CONTEXT_GLOBAL};
