use formwork_eval::{EvalResult, ExpressionEvaluator, HostBindings, JsEvaluator};
use formwork_rules::{Rule, RuleBook, RuleEngine, RuleError};
use formwork_types::{Context, Value};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const RULES: &str = r#"{
    "rule_sets": {
        "validation": {
            "adult": { "id": "adult", "name": "Adult", "condition": "age >= 18" },
            "has_name": { "condition": "typeof name === 'string' && name.length > 0" }
        },
        "business": {
            "senior_discount": {
                "condition": "age >= 65",
                "action": "discount * 100",
                "params": { "discount": 0.2 }
            },
            "always": { "action": "1" },
            "broken": { "condition": "true", "action": "throw new Error('no')" },
            "after_broken": { "action": "'ok'" }
        }
    }
}"#;

/// Delegates to the JS evaluator and records every call.
#[derive(Default)]
struct Recording {
    inner: JsEvaluator,
    calls: AtomicUsize,
    scopes: Mutex<Vec<(String, Context)>>,
}

impl Recording {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExpressionEvaluator for Recording {
    fn evaluate(&self, expression: &str, context: &Context) -> EvalResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scopes
            .lock()
            .unwrap()
            .push((expression.to_string(), context.clone()));
        self.inner.evaluate(expression, context)
    }

    fn evaluate_with_host(
        &self,
        expression: &str,
        context: &Context,
        host: Arc<dyn HostBindings>,
    ) -> EvalResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scopes
            .lock()
            .unwrap()
            .push((expression.to_string(), context.clone()));
        self.inner.evaluate_with_host(expression, context, host)
    }
}

fn ctx(value: serde_json::Value) -> Context {
    Value::from(value).into_map().unwrap()
}

fn engine_with(raw: &str) -> (RuleEngine, Arc<Recording>) {
    let evaluator = Arc::new(Recording::default());
    let book = Arc::new(RuleBook::load(raw).unwrap());
    (RuleEngine::new(book, evaluator.clone()), evaluator)
}

// ── Loading ──────────────────────────────────────────────────────

#[test]
fn loads_sets_in_declaration_order() {
    let book = RuleBook::load(RULES).unwrap();
    assert_eq!(book.set_names().collect::<Vec<_>>(), vec!["validation", "business"]);
    let ids: Vec<&str> = book.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["adult", "has_name", "senior_discount", "always", "broken", "after_broken"]
    );
    let discount = book.get("senior_discount").unwrap();
    assert_eq!(discount.params["discount"], Value::Number(0.2));
    assert_eq!(book.get("adult").unwrap().name.as_deref(), Some("Adult"));
}

#[test]
fn missing_rule_sets_fails_the_load() {
    let err = RuleBook::load(r#"{ "validationRules": { "r1": {} } }"#).unwrap_err();
    assert!(matches!(err, RuleError::InvalidDeclaration(msg) if msg.contains("rule_sets")));
}

#[test]
fn mismatched_and_duplicate_ids_fail_the_load() {
    let mismatched = r#"{ "rule_sets": { "a": { "r1": { "id": "r2" } } } }"#;
    assert!(matches!(RuleBook::load(mismatched), Err(RuleError::InvalidDeclaration(_))));

    let duplicate = r#"{ "rule_sets": { "a": { "r1": {} }, "b": { "r1": {} } } }"#;
    assert!(matches!(RuleBook::load(duplicate), Err(RuleError::DuplicateRule(id)) if id == "r1"));
}

#[test]
fn malformed_rules_fail_the_load() {
    let not_a_set = r#"{ "rule_sets": { "a": [] } }"#;
    assert!(RuleBook::load(not_a_set).is_err());
    let bad_condition = r#"{ "rule_sets": { "a": { "r1": { "condition": 3 } } } }"#;
    assert!(RuleBook::load(bad_condition).is_err());
}

// ── evaluate_rule ────────────────────────────────────────────────

#[test]
fn null_check_condition() {
    let (engine, _) = engine_with(
        r#"{ "rule_sets": { "checks": { "r1": { "id": "r1", "condition": "context.value == null" } } } }"#,
    );
    assert!(engine.evaluate_rule("r1", &ctx(json!({ "value": null }))));
    assert!(!engine.evaluate_rule("r1", &ctx(json!({ "value": 5 }))));
}

#[test]
fn unknown_rule_evaluates_false_but_fails_to_execute() {
    let (engine, evaluator) = engine_with(RULES);
    assert!(!engine.evaluate_rule("nope", &Context::new()));
    assert!(matches!(
        engine.execute_rule("nope", &Context::new()),
        Err(RuleError::RuleNotFound(id)) if id == "nope"
    ));
    assert_eq!(evaluator.calls(), 0);
}

#[test]
fn rule_without_condition_always_holds() {
    let (engine, evaluator) = engine_with(RULES);
    assert!(engine.evaluate_rule("always", &Context::new()));
    assert!(engine.evaluate_rule("always", &ctx(json!({ "anything": [1, 2] }))));
    assert_eq!(evaluator.calls(), 0);
}

#[test]
fn failing_condition_is_false() {
    let (engine, _) = engine_with(RULES);
    // `age` is absent, so the condition raises a ReferenceError
    assert!(!engine.evaluate_rule("adult", &Context::new()));
    assert!(engine.evaluate_rule("adult", &ctx(json!({ "age": 30 }))));
}

// ── execute_rule ─────────────────────────────────────────────────

#[test]
fn rule_without_action_never_calls_the_evaluator() {
    let (engine, evaluator) = engine_with(RULES);
    engine.execute_rule("adult", &ctx(json!({ "age": 3 }))).unwrap();
    assert_eq!(evaluator.calls(), 0);
}

#[test]
fn params_override_context_for_actions() {
    let (engine, evaluator) = engine_with(RULES);
    engine
        .execute_rule("senior_discount", &ctx(json!({ "age": 70, "discount": 0.5 })))
        .unwrap();

    let scopes = evaluator.scopes.lock().unwrap();
    let (expression, scope) = scopes.last().unwrap();
    assert_eq!(expression, "discount * 100");
    assert_eq!(scope["discount"], Value::Number(0.2));
    assert_eq!(scope["age"], Value::Number(70.0));
}

#[test]
fn action_errors_propagate() {
    let (engine, _) = engine_with(RULES);
    let err = engine.execute_rule("broken", &Context::new()).unwrap_err();
    assert!(matches!(err, RuleError::Evaluation { rule, .. } if rule == "broken"));
}

/// Collects every `emit` call.
#[derive(Default)]
struct Sink {
    emitted: Mutex<Vec<Value>>,
}

impl HostBindings for Sink {
    fn functions(&self) -> Vec<String> {
        vec!["emit".into()]
    }

    fn call(&self, _function: &str, args: Vec<Value>) -> Result<Value, String> {
        let first = args.into_iter().next().unwrap_or(Value::Null);
        self.emitted.lock().unwrap().push(first);
        Ok(Value::Null)
    }
}

const HOSTED: &str = r#"{
    "rule_sets": {
        "main": {
            "flag": { "condition": "typeof emit === 'undefined'", "action": "emit(age * 2)" }
        }
    }
}"#;

#[test]
fn actions_reach_the_host_but_conditions_do_not() {
    let sink = Arc::new(Sink::default());
    let (engine, _) = engine_with(HOSTED);
    let engine = engine.with_host(sink.clone());
    let context = ctx(json!({ "age": 21 }));

    assert!(engine.evaluate_rule("flag", &context));
    let report = engine.execute_matching_rules(&context);
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(*sink.emitted.lock().unwrap(), vec![Value::Number(42.0)]);
}

#[test]
fn actions_without_a_host_cannot_call_host_functions() {
    let (engine, _) = engine_with(HOSTED);
    let err = engine.execute_rule("flag", &ctx(json!({ "age": 21 }))).unwrap_err();
    assert!(matches!(err, RuleError::Evaluation { rule, .. } if rule == "flag"));
}

// ── Batches ──────────────────────────────────────────────────────

#[test]
fn evaluate_rules_lists_matches_in_order() {
    let (engine, _) = engine_with(RULES);
    let matches = engine.evaluate_rules(&ctx(json!({ "age": 70, "name": "Ada" })));
    assert_eq!(
        matches,
        vec!["adult", "has_name", "senior_discount", "always", "broken", "after_broken"]
    );

    let matches = engine.evaluate_rules(&ctx(json!({ "age": 12 })));
    assert_eq!(matches, vec!["always", "broken", "after_broken"]);
}

#[test]
fn evaluate_set_is_scoped() {
    let (engine, _) = engine_with(RULES);
    let context = ctx(json!({ "age": 20, "name": "" }));
    assert_eq!(engine.evaluate_set("validation", &context), vec!["adult"]);
    assert!(engine.evaluate_set("unknown", &context).is_empty());
}

#[test]
fn execute_matching_rules_isolates_failures() {
    let (engine, _) = engine_with(RULES);
    let report = engine.execute_matching_rules(&ctx(json!({ "age": 70, "name": "Ada" })));

    assert_eq!(
        report.executed,
        vec!["adult", "has_name", "senior_discount", "always", "after_broken"]
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].rule_id, "broken");
    assert!(report.failures[0].error.contains("no"));
    assert!(!report.is_clean());
}

#[test]
fn typed_books_reject_duplicates() {
    let sets = vec![
        ("a".to_string(), vec![Rule::new("x").with_condition("true")]),
        ("b".to_string(), vec![Rule::new("x").with_action("1").with_param("p", 1)]),
    ];
    assert!(matches!(RuleBook::from_sets(sets), Err(RuleError::DuplicateRule(_))));
}
