//! boa-backed evaluator.

use crate::bridge::{from_js, to_js};
use crate::config::EvaluatorConfig;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::ExpressionEvaluator;
use crate::host::{self, HostBindings};
use boa_engine::property::Attribute;
use boa_engine::{Context as JsContext, JsResult, JsString, Source};
use formwork_types::{Context, Value};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Global holding the whole evaluation context as one object.
pub const CONTEXT_GLOBAL: &str = "context";

/// Names the realm defines as non-configurable; context keys with these
/// names are only reachable through [`CONTEXT_GLOBAL`].
const RESERVED_GLOBALS: &[&str] = &["undefined", "NaN", "Infinity", "globalThis"];

/// Evaluates JavaScript expressions in a fresh realm per call.
///
/// The context is exposed as the `context` global and, in addition, each
/// top-level key becomes a global of its own, so both `age > 50` and
/// `context.age > 50` work. Nothing written by one evaluation is visible to
/// the next.
pub struct JsEvaluator {
    config: EvaluatorConfig,
    gate: Mutex<()>,
}

impl JsEvaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self {
            config,
            gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    fn realm(&self) -> JsContext {
        let mut realm = JsContext::default();
        let limits = realm.runtime_limits_mut();
        limits.set_loop_iteration_limit(self.config.loop_iteration_limit);
        limits.set_recursion_limit(self.config.recursion_limit);
        realm
    }
}

impl Default for JsEvaluator {
    fn default() -> Self {
        Self::new(EvaluatorConfig::default())
    }
}

impl ExpressionEvaluator for JsEvaluator {
    fn evaluate(&self, expression: &str, context: &Context) -> EvalResult<Value> {
        self.run(expression, context, None)
    }

    fn evaluate_with_host(
        &self,
        expression: &str,
        context: &Context,
        host: Arc<dyn HostBindings>,
    ) -> EvalResult<Value> {
        self.run(expression, context, Some(host))
    }
}

impl JsEvaluator {
    fn run(
        &self,
        expression: &str,
        context: &Context,
        host: Option<Arc<dyn HostBindings>>,
    ) -> EvalResult<Value> {
        let max = self.config.max_expression_length;
        if expression.len() > max {
            return Err(EvalError::ExpressionTooLarge {
                max,
                actual: expression.len(),
            });
        }

        let _guard = self.gate.lock().unwrap_or_else(|p| p.into_inner());
        let mut realm = self.realm();
        install(&mut realm, context).map_err(|e| EvalError::Setup(e.to_string()))?;
        let _scope = host
            .map(|host| host::bind(&mut realm, host))
            .transpose()
            .map_err(|e| EvalError::Setup(e.to_string()))?;

        let result = realm
            .eval(Source::from_bytes(expression))
            .map_err(|e| EvalError::Execution(e.to_string()))?;
        let value = from_js(&result, &mut realm).map_err(EvalError::Execution)?;
        trace!(expression, result = %value, "Evaluated expression");
        Ok(value)
    }
}

fn install(realm: &mut JsContext, context: &Context) -> JsResult<()> {
    let whole = to_js(&Value::Map(context.clone()), realm)?;
    realm.register_global_property(JsString::from(CONTEXT_GLOBAL), whole, Attribute::all())?;

    for (key, value) in context {
        if key == CONTEXT_GLOBAL || RESERVED_GLOBALS.contains(&key.as_str()) {
            continue;
        }
        let js = to_js(value, realm)?;
        realm.register_global_property(JsString::from(key.as_str()), js, Attribute::all())?;
    }
    Ok(())
}
