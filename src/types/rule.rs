use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single value or a list of values, as rule authors write either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item).iter(),
            OneOrMany::Many(items) => items.iter(),
        }
    }

    fn push(&mut self, item: T) {
        let items = match std::mem::replace(self, OneOrMany::Many(Vec::new())) {
            OneOrMany::One(first) => vec![first, item],
            OneOrMany::Many(mut items) => {
                items.push(item);
                items
            }
        };
        *self = OneOrMany::Many(items);
    }
}

/// A named mutation and its parameters. Engines emit these as events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Value,
}

impl Action {
    pub fn new(kind: impl Into<String>, params: Value) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }
}

/// A conditional rule.
///
/// With `field` set, every named field is checked on its own against
/// `conditions` and each match contributes the rule's actions. Without it,
/// `conditions` is a top-level condition keyed by fact name.
///
/// Deserializes from `{ field?, conditions | condition | when, event |
/// action | actions, order | priority? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<OneOrMany<String>>,
    #[serde(alias = "condition", alias = "when")]
    pub conditions: Value,
    #[serde(alias = "action", alias = "actions")]
    pub event: OneOrMany<Action>,
    #[serde(default, alias = "priority", skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
}

impl Rule {
    pub fn new(conditions: Value, action: Action) -> Self {
        Self {
            field: None,
            conditions,
            event: OneOrMany::One(action),
            order: None,
        }
    }

    /// Add a field to test `conditions` against.
    #[must_use]
    pub fn with_field(mut self, field: &str) -> Self {
        match self.field.as_mut() {
            Some(fields) => fields.push(field.to_owned()),
            None => self.field = Some(OneOrMany::One(field.to_owned())),
        }
        self
    }

    /// Append another action fired alongside the existing ones.
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.event.push(action);
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: f64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.field
            .iter()
            .flat_map(OneOrMany::iter)
            .map(String::as_str)
    }

    pub fn actions(&self) -> std::slice::Iter<'_, Action> {
        self.event.iter()
    }

    /// Parse a JSON array of rules.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the input is not a valid rule list.
    pub fn parse_list(input: &str) -> Result<Vec<Rule>, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Read a JSON file holding an array of rules.
    ///
    /// # Errors
    ///
    /// Returns [`FormRulesError`](crate::FormRulesError) on I/O or parse failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Vec<Rule>, crate::FormRulesError> {
        let input = std::fs::read_to_string(path)?;
        Ok(Self::parse_list(&input)?)
    }
}
