//! Loading and indexing rule declarations.

use crate::error::{RuleError, RuleResult};
use crate::rule::Rule;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Top-level key every rule document must carry.
const RULE_SETS_KEY: &str = "rule_sets";

/// An immutable collection of named rule sets.
///
/// Iteration follows set declaration order, then rule declaration order
/// within each set.
#[derive(Debug, Default)]
pub struct RuleBook {
    rules: Vec<Arc<Rule>>,
    index: HashMap<String, usize>,
    sets: Vec<(String, Vec<usize>)>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a rule document:
    ///
    /// ```json
    /// { "rule_sets": { "validation": { "r1": { "condition": "age > 0" } } } }
    /// ```
    pub fn load(raw: &str) -> RuleResult<Self> {
        let doc: serde_json::Value = serde_json::from_str(raw)?;
        Self::load_value(doc)
    }

    pub fn load_value(doc: serde_json::Value) -> RuleResult<Self> {
        let serde_json::Value::Object(mut root) = doc else {
            return Err(RuleError::InvalidDeclaration(
                "rule document must be an object".into(),
            ));
        };
        let sets = match root.remove(RULE_SETS_KEY) {
            Some(serde_json::Value::Object(sets)) => sets,
            Some(_) => {
                return Err(RuleError::InvalidDeclaration(format!(
                    "'{RULE_SETS_KEY}' must be an object"
                )));
            }
            None => {
                return Err(RuleError::InvalidDeclaration(format!(
                    "missing top-level '{RULE_SETS_KEY}'"
                )));
            }
        };

        let mut declared = Vec::with_capacity(sets.len());
        for (set_name, body) in sets {
            let serde_json::Value::Object(entries) = body else {
                return Err(RuleError::InvalidDeclaration(format!(
                    "rule set '{set_name}' must be an object"
                )));
            };
            let mut rules = Vec::with_capacity(entries.len());
            for (key, raw_rule) in entries {
                let mut rule: Rule = serde_json::from_value(raw_rule).map_err(|e| {
                    RuleError::InvalidDeclaration(format!("rule '{set_name}.{key}': {e}"))
                })?;
                if rule.id.is_empty() {
                    rule.id = key;
                } else if rule.id != key {
                    return Err(RuleError::InvalidDeclaration(format!(
                        "rule keyed '{key}' declares id '{}'",
                        rule.id
                    )));
                }
                rules.push(rule);
            }
            declared.push((set_name, rules));
        }

        let book = Self::from_sets(declared)?;
        info!(sets = book.sets.len(), rules = book.rules.len(), "Loaded rule sets");
        Ok(book)
    }

    /// Builds a book from already-typed sets. Rule ids must be unique
    /// across all sets.
    pub fn from_sets(sets: Vec<(String, Vec<Rule>)>) -> RuleResult<Self> {
        let mut book = Self::new();
        for (set_name, rules) in sets {
            let mut members = Vec::with_capacity(rules.len());
            for rule in rules {
                if book.index.contains_key(&rule.id) {
                    return Err(RuleError::DuplicateRule(rule.id));
                }
                let slot = book.rules.len();
                book.index.insert(rule.id.clone(), slot);
                book.rules.push(Arc::new(rule));
                members.push(slot);
            }
            book.sets.push((set_name, members));
        }
        Ok(book)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Rule>> {
        self.index.get(id).map(|&slot| &self.rules[slot])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Every rule, in book order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.sets
            .iter()
            .flat_map(move |(_, members)| members.iter().map(move |&slot| &self.rules[slot]))
    }

    /// Rules of one set in declaration order, or `None` for an unknown set.
    pub fn set(&self, name: &str) -> Option<impl Iterator<Item = &Arc<Rule>>> {
        self.sets
            .iter()
            .find(|(set_name, _)| set_name == name)
            .map(move |(_, members)| members.iter().map(move |&slot| &self.rules[slot]))
    }

    pub fn set_names(&self) -> impl Iterator<Item = &str> {
        self.sets.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
