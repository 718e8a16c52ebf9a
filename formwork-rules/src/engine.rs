use crate::book::RuleBook;
use crate::error::{RuleError, RuleResult};
use crate::rule::Rule;
use formwork_eval::{evaluate_condition, ExpressionEvaluator, HostBindings};
use formwork_types::Context;
use std::sync::Arc;
use tracing::{debug, warn};

/// A rule whose action failed during [`RuleEngine::execute_matching_rules`].
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFailure {
    pub rule_id: String,
    pub error: String,
}

/// Outcome of running every matching rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    /// Rules whose actions ran to completion, in execution order.
    pub executed: Vec<String>,
    pub failures: Vec<RuleFailure>,
}

impl ExecutionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Evaluates and executes the rules of one [`RuleBook`].
#[derive(Clone)]
pub struct RuleEngine {
    book: Arc<RuleBook>,
    evaluator: Arc<dyn ExpressionEvaluator>,
    host: Option<Arc<dyn HostBindings>>,
}

impl RuleEngine {
    pub fn new(book: Arc<RuleBook>, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        Self {
            book,
            evaluator,
            host: None,
        }
    }

    /// Makes `host`'s functions callable from rule actions. Conditions
    /// never see them.
    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn HostBindings>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn book(&self) -> &Arc<RuleBook> {
        &self.book
    }

    /// Whether a rule's condition holds. Unknown rules are false.
    pub fn evaluate_rule(&self, rule_id: &str, context: &Context) -> bool {
        match self.book.get(rule_id) {
            Some(rule) => self.condition_holds(rule, context),
            None => {
                debug!(rule = rule_id, "Evaluated unknown rule as false");
                false
            }
        }
    }

    /// Runs a rule's action against `context` overlaid with the rule's
    /// params. A rule without an action does nothing.
    pub fn execute_rule(&self, rule_id: &str, context: &Context) -> RuleResult<()> {
        let rule = self
            .book
            .get(rule_id)
            .ok_or_else(|| RuleError::RuleNotFound(rule_id.to_string()))?;
        self.run_action(rule, context)
    }

    /// Ids of every rule whose condition holds, in book order.
    pub fn evaluate_rules(&self, context: &Context) -> Vec<String> {
        self.matching(self.book.iter(), context)
    }

    /// Like [`evaluate_rules`](Self::evaluate_rules), restricted to one set.
    /// An unknown set matches nothing.
    pub fn evaluate_set(&self, set: &str, context: &Context) -> Vec<String> {
        match self.book.set(set) {
            Some(rules) => self.matching(rules, context),
            None => {
                debug!(set, "Evaluated unknown rule set");
                Vec::new()
            }
        }
    }

    /// Executes every matching rule in book order. A failing action is
    /// recorded and does not stop the rules after it.
    pub fn execute_matching_rules(&self, context: &Context) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        for rule in self.book.iter() {
            if !self.condition_holds(rule, context) {
                continue;
            }
            match self.run_action(rule, context) {
                Ok(()) => report.executed.push(rule.id.clone()),
                Err(e) => {
                    warn!(rule = %rule.id, "Rule action failed: {e}");
                    report.failures.push(RuleFailure {
                        rule_id: rule.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    fn matching<'a>(
        &self,
        rules: impl Iterator<Item = &'a Arc<Rule>>,
        context: &Context,
    ) -> Vec<String> {
        rules
            .filter(|rule| self.condition_holds(rule, context))
            .map(|rule| rule.id.clone())
            .collect()
    }

    fn condition_holds(&self, rule: &Rule, context: &Context) -> bool {
        match rule.condition.as_deref() {
            None => true,
            Some(condition) => evaluate_condition(self.evaluator.as_ref(), condition, context),
        }
    }

    fn run_action(&self, rule: &Rule, context: &Context) -> RuleResult<()> {
        let Some(action) = rule.action.as_deref() else {
            return Ok(());
        };
        let scope = rule.action_context(context);
        let result = match &self.host {
            Some(host) => self.evaluator.evaluate_with_host(action, &scope, host.clone()),
            None => self.evaluator.evaluate(action, &scope),
        };
        result.map_err(|source| RuleError::Evaluation {
                rule: rule.id.clone(),
                source,
            })?;
        debug!(rule = %rule.id, "Executed rule action");
        Ok(())
    }
}
