//! Rule-firing engine contract and the built-in matching engine.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::evaluate::Evaluator;
use crate::{Action, EngineError, ErrorMode, Facts, PredicateTable, Rule};

static NULL: Value = Value::Null;

/// Events fired by one engine run, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOutput {
    pub events: Vec<Action>,
}

/// Matches registered rules against facts and reports which actions fire.
///
/// Rules are registered once, before any run, in the order events should be
/// emitted. `run` must not change the registered rule set.
#[async_trait]
pub trait RuleEngine: Send + Sync {
    fn add_rule(&mut self, rule: Rule);

    /// Match facts against every registered rule.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when matching fails.
    async fn run(&self, facts: &Facts) -> Result<EngineOutput, EngineError>;
}

/// Options shared by every run of a [`MatchEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    predicates: Arc<PredicateTable>,
    mode: ErrorMode,
}

impl EngineOptions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            predicates: Arc::new(PredicateTable::builtin()),
            mode: ErrorMode::default(),
        }
    }

    #[must_use]
    pub fn predicates(mut self, table: PredicateTable) -> Self {
        self.predicates = Arc::new(table);
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: ErrorMode) -> Self {
        self.mode = mode;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine that evaluates rules with the crate's condition interpreter.
///
/// A rule with `field` fires its actions once for every listed field whose
/// fact satisfies the condition. A rule without `field` treats its condition
/// as a top-level condition keyed by fact name and fires at most once.
#[derive(Debug, Default)]
pub struct MatchEngine {
    rules: Vec<Rule>,
    options: EngineOptions,
}

impl MatchEngine {
    #[must_use]
    pub fn new(rules: Vec<Rule>, options: EngineOptions) -> Self {
        Self { rules, options }
    }

    /// Registered rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn fire(&self, facts: &Facts) -> Result<EngineOutput, EngineError> {
        let evaluator = Evaluator::new(&self.options.predicates).mode(self.options.mode);
        let mut events = Vec::new();
        for rule in &self.rules {
            let matches = if rule.field.is_some() {
                let mut count = 0;
                for field in rule.fields() {
                    let value = crate::locate::lookup(facts, field).unwrap_or(&NULL);
                    if evaluator.check(value, &rule.conditions)? {
                        count += 1;
                    }
                }
                count
            } else {
                usize::from(evaluator.apply_when_facts(&rule.conditions, facts)?)
            };
            for _ in 0..matches {
                events.extend(rule.actions().cloned());
            }
        }
        Ok(EngineOutput { events })
    }
}

#[async_trait]
impl RuleEngine for MatchEngine {
    fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    async fn run(&self, facts: &Facts) -> Result<EngineOutput, EngineError> {
        self.fire(facts)
    }
}
