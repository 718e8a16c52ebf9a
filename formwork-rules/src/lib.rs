//! Named condition/action rules evaluated through an [`ExpressionEvaluator`].
//!
//! Evaluation is advisory: an unknown rule or a failing condition is false.
//! Execution is an explicit effect: an unknown rule or a failing action is
//! an error.
//!
//! [`ExpressionEvaluator`]: formwork_eval::ExpressionEvaluator

mod book;
mod engine;
mod error;
mod rule;

pub use book::RuleBook;
pub use engine::{ExecutionReport, RuleEngine, RuleFailure};
pub use error::{RuleError, RuleResult};
pub use rule::Rule;
