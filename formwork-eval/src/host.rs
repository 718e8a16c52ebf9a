//! Host functions exposed to expressions.
//!
//! A [`HostBindings`] implementation names a set of functions and handles
//! calls to them. For the duration of one evaluation each name becomes a
//! global function in the realm; arguments and the return value cross the
//! boundary as [`Value`]s.

use crate::bridge::{from_js, to_js};
use boa_engine::object::FunctionObjectBuilder;
use boa_engine::property::Attribute;
use boa_engine::{Context as JsContext, JsNativeError, JsResult, JsString, JsValue, NativeFunction};
use formwork_types::Value;
use std::cell::RefCell;
use std::sync::Arc;

/// Functions an embedder makes callable from expressions.
///
/// A call must not evaluate another expression on the evaluator that is
/// running it.
pub trait HostBindings: Send + Sync {
    /// Names to install as globals.
    fn functions(&self) -> Vec<String>;

    /// Handles a call to `function`. An `Err` is thrown into the script.
    fn call(&self, function: &str, args: Vec<Value>) -> Result<Value, String>;
}

struct Active {
    host: Arc<dyn HostBindings>,
    functions: Vec<String>,
}

thread_local! {
    static ACTIVE: RefCell<Option<Active>> = const { RefCell::new(None) };
}

/// Keeps a host bound to the current thread until dropped.
pub(crate) struct HostScope(());

impl Drop for HostScope {
    fn drop(&mut self) {
        ACTIVE.with(|active| active.borrow_mut().take());
    }
}

/// Installs every function of `host` as a global of `realm`.
pub(crate) fn bind(realm: &mut JsContext, host: Arc<dyn HostBindings>) -> JsResult<HostScope> {
    let functions = host.functions();
    ACTIVE.with(|active| {
        *active.borrow_mut() = Some(Active {
            host,
            functions: functions.clone(),
        });
    });
    let scope = HostScope(());

    for (slot, name) in functions.iter().enumerate() {
        let native = NativeFunction::from_copy_closure(
            move |_this: &JsValue, args: &[JsValue], ctx: &mut JsContext| dispatch(slot, args, ctx),
        );
        let function = FunctionObjectBuilder::new(realm.realm(), native)
            .name(JsString::from(name.as_str()))
            .length(0)
            .constructor(false)
            .build();
        realm.register_global_property(JsString::from(name.as_str()), function, Attribute::all())?;
    }
    Ok(scope)
}

fn dispatch(slot: usize, args: &[JsValue], ctx: &mut JsContext) -> JsResult<JsValue> {
    let (host, name) = ACTIVE
        .with(|active| {
            active
                .borrow()
                .as_ref()
                .and_then(|a| a.functions.get(slot).map(|name| (a.host.clone(), name.clone())))
        })
        .ok_or_else(|| JsNativeError::error().with_message("host function is no longer bound"))?;

    let args = args
        .iter()
        .map(|arg| from_js(arg, ctx))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| JsNativeError::typ().with_message(e))?;
    let result = host
        .call(&name, args)
        .map_err(|e| JsNativeError::error().with_message(format!("{name}: {e}")))?;
    to_js(&result, ctx)
}
