use formwork_eval::{
    evaluate_condition, EvalError, EvaluatorConfig, ExpressionEvaluator, HostBindings, JsEvaluator,
};
use formwork_types::{Context, Value};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn ctx(value: serde_json::Value) -> Context {
    Value::from(value).into_map().unwrap()
}

fn eval(expression: &str, context: serde_json::Value) -> Result<Value, EvalError> {
    JsEvaluator::default().evaluate(expression, &ctx(context))
}

// ── Results ──────────────────────────────────────────────────────

#[test]
fn evaluates_arithmetic() {
    assert_eq!(eval("1 + 2", json!({})).unwrap(), Value::Number(3.0));
    assert_eq!(eval("7 / 2", json!({})).unwrap(), Value::Number(3.5));
}

#[test]
fn top_level_keys_are_globals() {
    assert_eq!(eval("age > 50", json!({ "age": 60 })).unwrap(), Value::Bool(true));
    assert_eq!(eval("age > 50", json!({ "age": 40 })).unwrap(), Value::Bool(false));
    assert_eq!(
        eval("name + '!'", json!({ "name": "Ada" })).unwrap(),
        Value::String("Ada!".into())
    );
}

#[test]
fn whole_context_is_reachable_as_object() {
    assert_eq!(
        eval("context.value == null", json!({ "value": null })).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(eval("context.value == null", json!({})).unwrap(), Value::Bool(true));
    assert_eq!(
        eval("context.value == null", json!({ "value": 0 })).unwrap(),
        Value::Bool(false)
    );
}

#[test]
fn nested_values_are_native_objects() {
    let context = json!({
        "patient": { "vitals": { "bp": 135 }, "tags": ["a", "b"] }
    });
    assert_eq!(eval("patient.vitals.bp > 120", context.clone()).unwrap(), Value::Bool(true));
    assert_eq!(eval("patient.tags.length", context.clone()).unwrap(), Value::Number(2.0));
    assert_eq!(
        eval("patient.tags.includes('b')", context).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn strings_are_not_reinterpreted_as_source() {
    let result = eval("note.length", json!({ "note": "'); throw 1; ('" })).unwrap();
    assert_eq!(result, Value::Number(15.0));
}

#[test]
fn objects_and_arrays_map_back() {
    assert_eq!(
        eval("({ a: 1, b: [true, 'x'] })", json!({})).unwrap(),
        Value::from(json!({ "a": 1, "b": [true, "x"] }))
    );
    assert_eq!(
        eval("[1, 2].map(n => n * 2)", json!({})).unwrap(),
        Value::from(json!([2, 4]))
    );
}

#[test]
fn values_without_counterpart_become_null() {
    assert_eq!(eval("undefined", json!({})).unwrap(), Value::Null);
    assert_eq!(eval("null", json!({})).unwrap(), Value::Null);
    assert_eq!(eval("Symbol('x')", json!({})).unwrap(), Value::Null);
    assert_eq!(eval("10n", json!({})).unwrap(), Value::Null);
    assert_eq!(eval("(function () {})", json!({})).unwrap(), Value::Null);
}

// ── Errors ───────────────────────────────────────────────────────

#[test]
fn undefined_names_are_errors() {
    assert!(matches!(
        eval("weight > 3", json!({ "age": 3 })),
        Err(EvalError::Execution(_))
    ));
}

#[test]
fn syntax_errors_and_throws_are_errors() {
    assert!(matches!(eval("age >", json!({ "age": 1 })), Err(EvalError::Execution(_))));
    assert!(matches!(
        eval("throw new Error('boom')", json!({})),
        Err(EvalError::Execution(msg)) if msg.contains("boom")
    ));
}

#[test]
fn oversized_expressions_are_rejected_before_running() {
    let evaluator = JsEvaluator::new(EvaluatorConfig {
        max_expression_length: 8,
        ..EvaluatorConfig::default()
    });
    let err = evaluator.evaluate("1 + 2 + 3 + 4", &Context::new()).unwrap_err();
    assert!(matches!(err, EvalError::ExpressionTooLarge { max: 8, actual: 13 }));
}

#[test]
fn runaway_loops_hit_the_iteration_limit() {
    let evaluator = JsEvaluator::new(EvaluatorConfig {
        loop_iteration_limit: 1_000,
        ..EvaluatorConfig::default()
    });
    assert!(evaluator.evaluate("while (true) {}", &Context::new()).is_err());
    assert_eq!(
        evaluator
            .evaluate("let n = 0; for (let i = 0; i < 100; i++) { n += i } n", &Context::new())
            .unwrap(),
        Value::Number(4950.0)
    );
}

#[test]
fn runaway_recursion_hits_the_depth_limit() {
    let evaluator = JsEvaluator::new(EvaluatorConfig {
        recursion_limit: 64,
        ..EvaluatorConfig::default()
    });
    let err = evaluator
        .evaluate("function f(n) { return f(n + 1) } f(0)", &Context::new())
        .unwrap_err();
    assert!(matches!(err, EvalError::Execution(_)));
}

// ── Isolation ────────────────────────────────────────────────────

#[test]
fn evaluations_do_not_share_state() {
    let evaluator = JsEvaluator::default();
    evaluator.evaluate("globalThis.leak = 1", &Context::new()).unwrap();
    assert_eq!(
        evaluator.evaluate("typeof leak", &Context::new()).unwrap(),
        Value::String("undefined".into())
    );
}

#[test]
fn mutations_do_not_reach_the_caller() {
    let evaluator = JsEvaluator::default();
    let context = ctx(json!({ "age": 30 }));
    evaluator.evaluate("age = 99; context.age = 99", &context).unwrap();
    assert_eq!(context["age"], Value::Number(30.0));
}

#[test]
fn usable_from_many_threads() {
    let evaluator = Arc::new(JsEvaluator::default());
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let evaluator = Arc::clone(&evaluator);
            std::thread::spawn(move || {
                evaluator
                    .evaluate("n * 2", &ctx(json!({ "n": n })))
                    .unwrap()
            })
        })
        .collect();
    let results: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        results,
        vec![Value::Number(0.0), Value::Number(2.0), Value::Number(4.0), Value::Number(6.0)]
    );
}

// ── Conditions ───────────────────────────────────────────────────

#[test]
fn only_literal_true_satisfies_a_condition() {
    let evaluator = JsEvaluator::default();
    let context = ctx(json!({ "age": 60 }));
    assert!(evaluate_condition(&evaluator, "age > 50", &context));
    assert!(!evaluate_condition(&evaluator, "age < 50", &context));
    assert!(!evaluate_condition(&evaluator, "1", &context));
    assert!(!evaluate_condition(&evaluator, "'true'", &context));
    assert!(!evaluate_condition(&evaluator, "missing > 1", &context));
    assert!(!evaluate_condition(&evaluator, "age >", &context));
}

// ── Host functions ───────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl HostBindings for Recorder {
    fn functions(&self) -> Vec<String> {
        vec!["echo".into(), "fail".into()]
    }

    fn call(&self, function: &str, args: Vec<Value>) -> Result<Value, String> {
        self.calls.lock().unwrap().push((function.to_string(), args.clone()));
        match function {
            "echo" => Ok(Value::List(args)),
            _ => Err("refused".into()),
        }
    }
}

#[test]
fn host_functions_receive_values_and_return_them() {
    let recorder = Arc::new(Recorder::default());
    let value = JsEvaluator::default()
        .evaluate_with_host(
            "echo(age, { tag: 'x' }).length",
            &ctx(json!({ "age": 7 })),
            recorder.clone(),
        )
        .unwrap();

    assert_eq!(value, Value::Number(2.0));
    let calls = recorder.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "echo");
    assert_eq!(
        calls[0].1,
        vec![Value::Number(7.0), Value::from(json!({ "tag": "x" }))]
    );
}

#[test]
fn host_errors_are_thrown_into_the_script() {
    let evaluator = JsEvaluator::default();
    let recorder: Arc<dyn HostBindings> = Arc::new(Recorder::default());

    let err = evaluator
        .evaluate_with_host("fail()", &Context::new(), recorder.clone())
        .unwrap_err();
    assert!(matches!(&err, EvalError::Execution(m) if m.contains("refused")), "{err}");

    let caught = evaluator
        .evaluate_with_host(
            "try { fail(); 'no' } catch (e) { 'caught' }",
            &Context::new(),
            recorder,
        )
        .unwrap();
    assert_eq!(caught, Value::String("caught".into()));
}

#[test]
fn host_functions_are_absent_without_a_host() {
    let evaluator = JsEvaluator::default();
    let recorder = Arc::new(Recorder::default());
    evaluator
        .evaluate_with_host("echo(1)", &Context::new(), recorder)
        .unwrap();

    assert_eq!(
        evaluator.evaluate("typeof echo", &Context::new()).unwrap(),
        Value::String("undefined".into())
    );
}
