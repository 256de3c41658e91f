use std::fmt;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::actions::{ActionHandler, ActionRegistry};
use crate::engine::{EngineOptions, MatchEngine, RuleEngine};
use crate::order::order_rules;
use crate::{ActionError, EngineError, ErrorMode, Facts, PredicateTable, Rule};

/// Errors raised while converging.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("facts did not converge within {limit} rounds")]
    RoundLimit { limit: usize },
}

/// Runner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    mode: ErrorMode,
    max_rounds: Option<usize>,
    validate_actions: Option<bool>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            mode: ErrorMode::default(),
            max_rounds: None,
            validate_actions: None,
        }
    }
}

impl RunnerOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(mut self, mode: ErrorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Give up after `limit` rounds. Unset by default: a rule set whose
    /// actions keep changing the facts loops forever.
    #[must_use]
    pub fn max_rounds(mut self, limit: Option<usize>) -> Self {
        self.max_rounds = limit;
        self
    }

    /// Validate every rule's actions when the runner is built. Defaults to
    /// on in [`ErrorMode::Development`] and off in production.
    #[must_use]
    pub fn validate_actions(mut self, enabled: bool) -> Self {
        self.validate_actions = Some(enabled);
        self
    }

    fn should_validate(&self) -> bool {
        self.validate_actions
            .unwrap_or(self.mode == ErrorMode::Development)
    }
}

/// A converged configuration: both documents and the facts they settled on.
#[derive(Debug, Clone, PartialEq)]
pub struct Conf {
    pub form_def: Value,
    pub ui_def: Value,
    /// `None` when recompute was called without facts.
    pub facts: Option<Facts>,
    /// Rounds run before the facts stopped changing.
    pub rounds: usize,
}

/// Builder for a [`RulesRunner`].
///
/// # Example
///
/// ```
/// use form_rules::{RulesRunner, Rule, Action};
/// use serde_json::json;
///
/// let runner = RulesRunner::builder(json!({ "properties": { "a": {} } }), json!({}))
///     .rule(Rule::new(json!({ "a": "empty" }), Action::new("require", json!({ "field": "a" }))))
///     .build()
///     .unwrap();
/// ```
pub struct RulesRunnerBuilder {
    form_def: Value,
    ui_def: Value,
    rules: Vec<Rule>,
    engine: Option<Box<dyn RuleEngine>>,
    predicates: Option<PredicateTable>,
    actions: ActionRegistry,
    options: RunnerOptions,
}

impl RulesRunnerBuilder {
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Add rules from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the input is not a valid rule list.
    pub fn rules_json(self, input: &str) -> Result<Self, serde_json::Error> {
        Ok(self.rules(Rule::parse_list(input)?))
    }

    /// Add rules from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`FormRulesError`](crate::FormRulesError) on I/O or parse failure.
    pub fn rules_file(self, path: impl AsRef<Path>) -> Result<Self, crate::FormRulesError> {
        Ok(self.rules(Rule::from_file(path)?))
    }

    /// Use an external engine instead of the built-in [`MatchEngine`].
    #[must_use]
    pub fn engine(mut self, engine: impl RuleEngine + 'static) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    /// Predicate vocabulary for the built-in engine.
    #[must_use]
    pub fn predicates(mut self, table: PredicateTable) -> Self {
        self.predicates = Some(table);
        self
    }

    /// Register an extra action handler; it shadows a built-in of the same name.
    #[must_use]
    pub fn action(mut self, name: &str, handler: impl ActionHandler + 'static) -> Self {
        self.actions = self.actions.with(name, handler);
        self
    }

    #[must_use]
    pub fn options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    /// Order the rules, register them with the engine and freeze the runner.
    ///
    /// # Errors
    ///
    /// When action validation is on, returns the first [`ActionError`] found
    /// in any rule's actions.
    pub fn build(self) -> Result<RulesRunner, ActionError> {
        if self.options.should_validate() {
            for action in self.rules.iter().flat_map(Rule::actions) {
                self.actions.validate(action, &self.form_def, &self.ui_def)?;
            }
        }

        let mut engine: Box<dyn RuleEngine> = match self.engine {
            Some(engine) => engine,
            None => {
                let options = EngineOptions::new()
                    .predicates(self.predicates.unwrap_or_else(PredicateTable::builtin))
                    .mode(self.options.mode);
                Box::new(MatchEngine::new(Vec::new(), options))
            }
        };
        let rule_count = self.rules.len();
        for rule in order_rules(self.rules) {
            engine.add_rule(rule);
        }
        tracing::debug!(rules = rule_count, "rules registered");

        Ok(RulesRunner {
            form_def: self.form_def,
            ui_def: self.ui_def,
            engine,
            actions: self.actions,
            options: self.options,
        })
    }
}

/// Applies rules to a form and presentation definition until facts settle.
///
/// Each round works on fresh copies of the initial documents and the
/// previous round's facts: the engine fires, every event is applied in
/// order, and the resulting facts are compared with the round's input.
/// Equal facts end the loop. Nothing from a superseded round is visible to
/// the caller.
///
/// `recompute` borrows the runner immutably, so concurrent calls cannot
/// interfere with each other's working set; ordering their results is up to
/// the caller.
pub struct RulesRunner {
    form_def: Value,
    ui_def: Value,
    engine: Box<dyn RuleEngine>,
    actions: ActionRegistry,
    options: RunnerOptions,
}

impl RulesRunner {
    #[must_use]
    pub fn builder(form_def: Value, ui_def: Value) -> RulesRunnerBuilder {
        RulesRunnerBuilder {
            form_def,
            ui_def,
            rules: Vec::new(),
            engine: None,
            predicates: None,
            actions: ActionRegistry::new(),
            options: RunnerOptions::default(),
        }
    }

    /// Run rounds until the facts stop changing.
    ///
    /// Without facts the initial documents are returned untouched.
    ///
    /// # Errors
    ///
    /// Engine and action failures abort the recompute; so does exceeding
    /// [`RunnerOptions::max_rounds`] when set.
    pub async fn recompute(&self, facts: Option<Facts>) -> Result<Conf, RunError> {
        let Some(mut facts) = facts else {
            return Ok(Conf {
                form_def: self.form_def.clone(),
                ui_def: self.ui_def.clone(),
                facts: None,
                rounds: 0,
            });
        };

        let mut rounds = 0;
        loop {
            if let Some(limit) = self.options.max_rounds {
                if rounds >= limit {
                    tracing::warn!(limit, "facts did not converge");
                    return Err(RunError::RoundLimit { limit });
                }
            }
            rounds += 1;

            let (form_def, ui_def, next) = self.round(&facts).await?;
            if next == facts {
                tracing::debug!(rounds, "converged");
                return Ok(Conf {
                    form_def,
                    ui_def,
                    facts: Some(next),
                    rounds,
                });
            }
            tracing::debug!(round = rounds, "facts changed, re-running rules");
            facts = next;
        }
    }

    async fn round(&self, facts: &Facts) -> Result<(Value, Value, Facts), RunError> {
        let mut form_def = self.form_def.clone();
        let mut ui_def = self.ui_def.clone();
        let mut next = facts.clone();

        let output = self.engine.run(facts).await?;
        tracing::debug!(events = output.events.len(), "rules fired");
        for event in &output.events {
            self.actions
                .execute(event, &mut form_def, &mut ui_def, &mut next)?;
        }
        Ok((form_def, ui_def, next))
    }

    #[must_use]
    pub fn form_def(&self) -> &Value {
        &self.form_def
    }

    #[must_use]
    pub fn ui_def(&self) -> &Value {
        &self.ui_def
    }
}

impl fmt::Debug for RulesRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RulesRunner")
            .field("actions", &self.actions)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
