use serde_json::Value;

use super::{field_params, whole_field};
use crate::locate::schema_owner_mut;
use crate::ActionError;

const NAME: &str = "require";

/// Add each field to its owning schema's `required` list.
pub(super) fn apply(params: &Value, form_def: &mut Value) -> Result<(), ActionError> {
    for path in field_params(NAME, params)? {
        let path = whole_field(NAME, path)?;
        let (owner, leaf) = schema_owner_mut(form_def, &path).map_err(|source| {
            ActionError::Path {
                action: NAME.to_owned(),
                source,
            }
        })?;
        let required = owner
            .entry("required")
            .or_insert_with(|| Value::Array(Vec::new()));
        match required {
            Value::Array(list) => {
                if !list.iter().any(|r| r.as_str() == Some(leaf.as_str())) {
                    list.push(Value::String(leaf));
                }
            }
            other => *other = Value::Array(vec![Value::String(leaf)]),
        }
    }
    Ok(())
}
