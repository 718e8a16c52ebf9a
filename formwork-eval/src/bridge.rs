//! Structural conversion between Formwork values and JS values.

use boa_engine::object::builtins::JsArray;
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsResult, JsString, JsValue};
use formwork_types::Value;

/// Builds the JS value for `value` inside `ctx`'s realm.
pub(crate) fn to_js(value: &Value, ctx: &mut Context) -> JsResult<JsValue> {
    Ok(match value {
        Value::Null => JsValue::null(),
        Value::Bool(b) => JsValue::from(*b),
        Value::Number(n) => JsValue::from(*n),
        Value::String(s) => JsValue::from(JsString::from(s.as_str())),
        Value::List(items) => {
            let elements = items
                .iter()
                .map(|item| to_js(item, ctx))
                .collect::<JsResult<Vec<_>>>()?;
            JsArray::from_iter(elements, ctx).into()
        }
        Value::Map(map) => {
            let entries = map
                .iter()
                .map(|(key, item)| Ok((JsString::from(key.as_str()), to_js(item, ctx)?)))
                .collect::<JsResult<Vec<_>>>()?;
            let mut init = ObjectInitializer::new(ctx);
            for (key, item) in entries {
                init.property(key, item, Attribute::all());
            }
            init.build().into()
        }
    })
}

/// Maps an evaluation result back into a Formwork value.
///
/// `undefined`, symbols, bigints and functions have no counterpart and
/// become null. Objects and arrays go through the engine's JSON conversion.
pub(crate) fn from_js(value: &JsValue, ctx: &mut Context) -> Result<Value, String> {
    if value.is_undefined()
        || value.is_null()
        || value.is_symbol()
        || value.is_bigint()
        || value.is_callable()
    {
        return Ok(Value::Null);
    }
    if let Some(b) = value.as_boolean() {
        return Ok(Value::Bool(b));
    }
    if let Some(n) = value.as_number() {
        return Ok(Value::Number(n));
    }
    if let Some(s) = value.as_string() {
        return Ok(Value::String(s.to_std_string_escaped()));
    }
    value
        .to_json(ctx)
        .map(Value::from)
        .map_err(|e| e.to_string())
}
