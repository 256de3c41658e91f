use std::collections::BTreeMap;

use serde_json::Value;

use crate::{ConditionError, ErrorMode, Facts, PredicateTable, Scope};

static NULL: Value = Value::Null;

/// How the keys of one condition object are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    /// All keys must hold.
    #[default]
    Every,
    /// At least one key must hold.
    Some,
}

impl Combinator {
    /// Fold results, short-circuiting like `all` / `any`. Errors raised by an
    /// item that is never reached are not observed.
    fn combine<I>(self, results: I) -> Result<bool, ConditionError>
    where
        I: IntoIterator<Item = Result<bool, ConditionError>>,
    {
        for result in results {
            match (self, result?) {
                (Combinator::Every, false) => return Ok(false),
                (Combinator::Some, true) => return Ok(true),
                _ => {}
            }
        }
        Ok(self == Combinator::Every)
    }
}

/// Interpreter for condition trees over a predicate vocabulary.
///
/// A condition tree is either a predicate name (`"empty"`) or an object
/// mapping predicate names to arguments (`{ "greater": 5, "less": 10 }`).
/// Two keys are reserved: `or` takes an array of trees and holds if any
/// does; `not` evaluates its subtree against the opposite polarity of the
/// table. An object-valued argument descends into the nested table of that
/// name, so `{ "length": { "greater": 10 } }` composes.
///
/// # Example
///
/// ```
/// use form_rules::{Evaluator, PredicateTable};
/// use serde_json::json;
///
/// let table = PredicateTable::builtin();
/// let eval = Evaluator::new(&table);
/// assert!(eval.check(&json!(5), &json!({ "lessThan": 18 })).unwrap());
/// assert!(eval.check(&json!("b"), &json!({ "or": [{ "equals": "a" }, { "equals": "b" }] })).unwrap());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    table: &'a PredicateTable,
    mode: ErrorMode,
}

impl<'a> Evaluator<'a> {
    #[must_use]
    pub fn new(table: &'a PredicateTable) -> Self {
        Self {
            table,
            mode: ErrorMode::default(),
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: ErrorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Check `value` against `condition` with the positive root table.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError`] for unknown predicates, and for malformed
    /// trees in [`ErrorMode::Development`].
    pub fn check(&self, value: &Value, condition: &Value) -> Result<bool, ConditionError> {
        self.check_in(value, condition, Scope::positive(self.table), Combinator::Every)
    }

    /// Check `value` against `condition` in an explicit scope and combinator.
    ///
    /// # Errors
    ///
    /// See [`check`](Self::check).
    pub fn check_in(
        &self,
        value: &Value,
        condition: &Value,
        scope: Scope<'_>,
        combinator: Combinator,
    ) -> Result<bool, ConditionError> {
        match condition {
            Value::String(name) => scope.test(name, value, None),
            Value::Object(keys) => combinator.combine(
                keys.iter()
                    .map(|(key, arg)| self.check_key(value, key, arg, scope)),
            ),
            // Looked up by its JSON text, so it surfaces like any other
            // unregistered name in every mode.
            other => Err(ConditionError::UnknownPredicate {
                name: other.to_string(),
            }),
        }
    }

    fn check_key(
        &self,
        value: &Value,
        key: &str,
        arg: &Value,
        scope: Scope<'_>,
    ) -> Result<bool, ConditionError> {
        match key {
            "or" => match arg {
                Value::Array(branches) => Combinator::Some.combine(
                    branches
                        .iter()
                        .map(|branch| self.check_in(value, branch, scope, Combinator::Every)),
                ),
                _ => self.malformed("OR must be an array".to_owned()),
            },
            "not" => self.check_in(value, arg, scope.negated(), Combinator::Every),
            _ => match arg {
                Value::Object(_) => {
                    let (nested, projection) = scope.nested(key)?;
                    match projection {
                        Some(project) => {
                            self.check_in(&project(value), arg, nested, Combinator::Every)
                        }
                        None => self.check_in(value, arg, nested, Combinator::Every),
                    }
                }
                _ => scope.test(key, value, Some(arg)),
            },
        }
    }

    /// Evaluate a top-level rule condition against a fact object.
    ///
    /// Keys `and` / `or` recurse with the matching combinator; any other key
    /// names a fact whose value is checked against the mapped condition tree.
    /// A missing fact is checked as `null`.
    ///
    /// # Errors
    ///
    /// Non-object `rule` or `facts` is a malformed condition; see
    /// [`check`](Self::check) for the rest.
    pub fn apply_when(
        &self,
        rule: &Value,
        facts: &Value,
        combinator: Combinator,
    ) -> Result<bool, ConditionError> {
        match (rule, facts) {
            (Value::Object(_), Value::Object(fact_map)) => self.when_in(rule, fact_map, combinator),
            _ => self.malformed(format!("Rule {rule} with {facts} can't be processed")),
        }
    }

    /// [`apply_when`](Self::apply_when) over an already-typed fact base.
    ///
    /// # Errors
    ///
    /// See [`apply_when`](Self::apply_when).
    pub fn apply_when_facts(&self, rule: &Value, facts: &Facts) -> Result<bool, ConditionError> {
        self.when_in(rule, facts, Combinator::Every)
    }

    fn when_in(
        &self,
        rule: &Value,
        facts: &Facts,
        combinator: Combinator,
    ) -> Result<bool, ConditionError> {
        let Value::Object(keys) = rule else {
            return self.malformed(format!("Rule {rule} can't be processed"));
        };
        combinator.combine(keys.iter().map(|(key, sub)| match key.as_str() {
            "or" => self.when_in(sub, facts, Combinator::Some),
            "and" => self.when_in(sub, facts, Combinator::Every),
            _ => self.check(crate::locate::lookup(facts, key).unwrap_or(&NULL), sub),
        }))
    }

    /// Map each field of a field-keyed rule object to the actions of its
    /// rules whose `when` holds. Rules are `{ when, action }`, singly or as a
    /// list. Fields with no firing rule are omitted.
    ///
    /// # Errors
    ///
    /// Propagates condition errors; a rules value that is not an object is
    /// malformed.
    pub fn field_to_actions(
        &self,
        rules: &Value,
        form_data: &Value,
    ) -> Result<BTreeMap<String, Vec<Value>>, ConditionError> {
        let Value::Object(by_field) = rules else {
            self.malformed(format!("field rules {rules} must be an object"))?;
            return Ok(BTreeMap::new());
        };
        let mut fired = BTreeMap::new();
        for (field, field_rules) in by_field {
            let candidates = match field_rules {
                Value::Array(list) => list.iter().collect::<Vec<_>>(),
                single => vec![single],
            };
            let mut actions = Vec::new();
            for rule in candidates {
                let when = rule.get("when").unwrap_or(&NULL);
                if self.apply_when(when, form_data, Combinator::Every)? {
                    actions.push(rule.get("action").cloned().unwrap_or(Value::Null));
                }
            }
            if !actions.is_empty() {
                fired.insert(field.clone(), actions);
            }
        }
        Ok(fired)
    }

    fn malformed(&self, message: String) -> Result<bool, ConditionError> {
        match self.mode {
            ErrorMode::Development => Err(ConditionError::Malformed { message }),
            ErrorMode::Production => {
                tracing::error!(%message, "malformed condition evaluates to false");
                Ok(false)
            }
        }
    }
}
