use serde_json::Value;

use super::field_params;
use crate::locate::{schema_owner_mut, ui_owner_mut, unset, UI_ORDER};
use crate::ActionError;

const NAME: &str = "remove";

/// Remove each field from the form definition (`properties` and `required`),
/// from the presentation definition (its entry and its `ui:order` slot) and
/// from the `entity` fact subtree.
///
/// A reference ending in an index (`tags[0]`) removes that element from the
/// data only; both definitions still describe the array.
pub(super) fn apply(
    params: &Value,
    form_def: &mut Value,
    ui_def: &mut Value,
    mut entity: Option<&mut Value>,
) -> Result<(), ActionError> {
    for path in field_params(NAME, params)? {
        if path.ends_with_index() {
            if let Some(entity) = entity.as_deref_mut() {
                unset(entity, &path);
            }
            continue;
        }

        let (owner, leaf) = schema_owner_mut(form_def, &path).map_err(|source| {
            ActionError::Path {
                action: NAME.to_owned(),
                source,
            }
        })?;
        if let Some(Value::Array(required)) = owner.get_mut("required") {
            required.retain(|r| r.as_str() != Some(leaf.as_str()));
        }
        if let Some(Value::Object(properties)) = owner.get_mut("properties") {
            properties.remove(&leaf);
        }

        if let Some((ui_owner, leaf)) = ui_owner_mut(ui_def, form_def, &path, false) {
            ui_owner.remove(&leaf);
            if let Some(Value::Array(order)) = ui_owner.get_mut(UI_ORDER) {
                order.retain(|slot| slot.as_str() != Some(leaf.as_str()));
            }
        }

        if let Some(entity) = entity.as_deref_mut() {
            unset(entity, &path);
        }
    }
    Ok(())
}
