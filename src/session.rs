//! Stateful wrapper for hosts that feed form data as it is edited.

use serde_json::Value;

use crate::runner::{Conf, RulesRunner, RunError};
use crate::{entity_facts, Facts, ENTITY};

/// Outcome of feeding new data to a [`FormSession`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUpdate {
    /// The form or presentation definition differs from the previous one.
    pub conf_changed: bool,
    /// Actions rewrote the submitted data; `form_data` holds the result.
    pub data_changed: bool,
    pub form_data: Value,
}

/// Tracks the latest configuration for one form instance.
///
/// Data is wrapped as the `entity` fact before rules run. Feeding data equal
/// to the last converged data is a no-op.
#[derive(Debug)]
pub struct FormSession<'r> {
    runner: &'r RulesRunner,
    facts: Facts,
    form_def: Value,
    ui_def: Value,
}

impl<'r> FormSession<'r> {
    /// Start a session and run rules over the initial data.
    ///
    /// # Errors
    ///
    /// Propagates any [`RunError`] from the first recompute.
    pub async fn start(runner: &'r RulesRunner, form_data: Value) -> Result<Self, RunError> {
        let mut session = Self {
            runner,
            facts: Facts::new(),
            form_def: runner.form_def().clone(),
            ui_def: runner.ui_def().clone(),
        };
        session.recompute(entity_facts(form_data)).await?;
        Ok(session)
    }

    /// Feed edited form data.
    ///
    /// Returns `None` when the data matches what the session already holds.
    ///
    /// # Errors
    ///
    /// Propagates any [`RunError`]; the session keeps its previous state.
    pub async fn update(&mut self, form_data: Value) -> Result<Option<SessionUpdate>, RunError> {
        let facts = entity_facts(form_data);
        if facts == self.facts {
            return Ok(None);
        }
        self.recompute(facts).await.map(Some)
    }

    async fn recompute(&mut self, input: Facts) -> Result<SessionUpdate, RunError> {
        let Conf {
            form_def,
            ui_def,
            facts,
            ..
        } = self.runner.recompute(Some(input.clone())).await?;
        let facts = facts.unwrap_or_default();

        let data_changed = facts != input;
        let conf_changed = form_def != self.form_def || ui_def != self.ui_def;
        if data_changed {
            tracing::debug!("rules rewrote form data");
        }

        self.form_def = form_def;
        self.ui_def = ui_def;
        self.facts = facts;
        Ok(SessionUpdate {
            conf_changed,
            data_changed,
            form_data: self.form_data(),
        })
    }

    #[must_use]
    pub fn form_def(&self) -> &Value {
        &self.form_def
    }

    #[must_use]
    pub fn ui_def(&self) -> &Value {
        &self.ui_def
    }

    /// Current form data, unwrapped from the `entity` fact.
    #[must_use]
    pub fn form_data(&self) -> Value {
        self.facts.get(ENTITY).cloned().unwrap_or(Value::Null)
    }
}
