//! Action dispatch and the built-in document mutations.

mod remove;
mod require;
mod ui;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::{Action, ActionError, Facts, FieldPath, ENTITY};

/// A named mutation applied when a rule fires.
///
/// Handlers mutate the form definition, presentation definition and the
/// `entity` fact subtree in place. They never copy; the runner hands them
/// round-private copies.
pub trait ActionHandler: Send + Sync {
    /// Apply the mutation.
    ///
    /// `entity` is the `entity` fact subtree when present; `extra` holds every
    /// other fact.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] for bad parameters or unresolvable fields.
    fn apply(
        &self,
        params: &Value,
        form_def: &mut Value,
        ui_def: &mut Value,
        entity: Option<&mut Value>,
        extra: &Facts,
    ) -> Result<(), ActionError>;

    /// Check `params` against the documents before any rule runs.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] describing the first problem found.
    fn validate(&self, _params: &Value, _form_def: &Value, _ui_def: &Value) -> Result<(), ActionError> {
        Ok(())
    }
}

/// The fixed table of built-in actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinAction {
    Remove,
    Require,
    UiAppend,
    UiReplace,
    UiOverride,
}

impl BuiltinAction {
    #[must_use]
    pub fn from_name(name: &str) -> Option<&'static BuiltinAction> {
        match name {
            "remove" => Some(&BuiltinAction::Remove),
            "require" => Some(&BuiltinAction::Require),
            "uiAppend" => Some(&BuiltinAction::UiAppend),
            "uiReplace" => Some(&BuiltinAction::UiReplace),
            "uiOverride" => Some(&BuiltinAction::UiOverride),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            BuiltinAction::Remove => "remove",
            BuiltinAction::Require => "require",
            BuiltinAction::UiAppend => "uiAppend",
            BuiltinAction::UiReplace => "uiReplace",
            BuiltinAction::UiOverride => "uiOverride",
        }
    }
}

impl ActionHandler for BuiltinAction {
    fn apply(
        &self,
        params: &Value,
        form_def: &mut Value,
        ui_def: &mut Value,
        entity: Option<&mut Value>,
        _extra: &Facts,
    ) -> Result<(), ActionError> {
        match self {
            BuiltinAction::Remove => remove::apply(params, form_def, ui_def, entity),
            BuiltinAction::Require => require::apply(params, form_def),
            BuiltinAction::UiAppend => ui::append(params, form_def, ui_def),
            BuiltinAction::UiReplace => ui::replace(params, form_def, ui_def),
            BuiltinAction::UiOverride => ui::override_props(params, form_def, ui_def),
        }
    }

    fn validate(&self, params: &Value, form_def: &Value, _ui_def: &Value) -> Result<(), ActionError> {
        let name = self.name();
        let paths: Vec<FieldPath> = match self {
            BuiltinAction::Remove => field_params(name, params)?,
            BuiltinAction::Require => field_params(name, params)?
                .into_iter()
                .map(|path| whole_field(name, path))
                .collect::<Result<_, _>>()?,
            BuiltinAction::UiAppend | BuiltinAction::UiReplace | BuiltinAction::UiOverride => {
                ui::field_keys(name, params)?
            }
        };
        declared(name, &paths, form_def)
    }
}

/// Resolves action names to handlers and invokes them.
///
/// Caller-registered handlers shadow built-ins of the same name.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    extra: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`.
    #[must_use]
    pub fn with(mut self, name: &str, handler: impl ActionHandler + 'static) -> Self {
        self.insert(name, Arc::new(handler));
        self
    }

    /// Register a handler (mutable reference version).
    pub fn insert(&mut self, name: &str, handler: Arc<dyn ActionHandler>) {
        self.extra.insert(name.to_owned(), handler);
    }

    #[must_use]
    pub fn resolve(&self, kind: &str) -> Option<&dyn ActionHandler> {
        match self.extra.get(kind) {
            Some(handler) => Some(handler.as_ref()),
            None => BuiltinAction::from_name(kind).map(|b| b as &dyn ActionHandler),
        }
    }

    /// Apply one fired event to the documents and facts.
    ///
    /// The `entity` fact is handed to the handler on its own; everything else
    /// is passed read-only.
    ///
    /// # Errors
    ///
    /// [`ActionError::UnknownAction`] when no handler matches; otherwise
    /// whatever the handler reports. Earlier mutations are not rolled back.
    pub fn execute(
        &self,
        event: &Action,
        form_def: &mut Value,
        ui_def: &mut Value,
        facts: &mut Facts,
    ) -> Result<(), ActionError> {
        let handler = self
            .resolve(&event.kind)
            .ok_or_else(|| ActionError::UnknownAction {
                kind: event.kind.clone(),
            })?;
        tracing::trace!(action = %event.kind, "applying action");

        let mut entity = facts.remove(ENTITY);
        let result = handler.apply(&event.params, form_def, ui_def, entity.as_mut(), facts);
        if let Some(entity) = entity {
            facts.insert(ENTITY.to_owned(), entity);
        }
        result
    }

    /// Validate an action against the documents without applying it.
    ///
    /// # Errors
    ///
    /// [`ActionError::UnknownAction`] or the handler's own validation error.
    pub fn validate(&self, action: &Action, form_def: &Value, ui_def: &Value) -> Result<(), ActionError> {
        let handler = self
            .resolve(&action.kind)
            .ok_or_else(|| ActionError::UnknownAction {
                kind: action.kind.clone(),
            })?;
        handler.validate(&action.params, form_def, ui_def)
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.extra.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ActionRegistry").field("extra", &names).finish()
    }
}

/// Parse a `{ field: string | [string] }` parameter object.
pub(crate) fn field_params(action: &str, params: &Value) -> Result<Vec<FieldPath>, ActionError> {
    let invalid = |message: &str| ActionError::InvalidParams {
        action: action.to_owned(),
        message: message.to_owned(),
    };
    let fields: Vec<&str> = match params.get("field") {
        Some(Value::String(field)) => vec![field.as_str()],
        Some(Value::Array(fields)) => fields
            .iter()
            .map(|f| f.as_str().ok_or_else(|| invalid("'field' entries must be strings")))
            .collect::<Result<_, _>>()?,
        _ => return Err(invalid("'field' must be a string or an array of strings")),
    };
    fields.into_iter().map(|f| parse_field(action, f)).collect()
}

/// Reject a reference to one array element. The definitions describe an
/// array as a whole, so only data-side effects can target an element.
pub(crate) fn whole_field(action: &str, path: FieldPath) -> Result<FieldPath, ActionError> {
    if path.ends_with_index() {
        return Err(ActionError::InvalidParams {
            action: action.to_owned(),
            message: format!("'{path}' addresses a single array element"),
        });
    }
    Ok(path)
}

pub(crate) fn parse_field(action: &str, field: &str) -> Result<FieldPath, ActionError> {
    FieldPath::parse(field).map_err(|source| ActionError::Path {
        action: action.to_owned(),
        source,
    })
}

fn declared(action: &str, paths: &[FieldPath], form_def: &Value) -> Result<(), ActionError> {
    match paths
        .iter()
        .find(|path| !crate::locate::schema_declares(form_def, path))
    {
        Some(missing) => Err(ActionError::Path {
            action: action.to_owned(),
            source: crate::PathError::UnknownField {
                field: missing.to_string(),
            },
        }),
        None => Ok(()),
    }
}
