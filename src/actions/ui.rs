use serde_json::{Map, Value};

use super::{parse_field, whole_field};
use crate::locate::ui_owner_mut;
use crate::{ActionError, FieldPath};

/// Field keys of a `{ <field>: <value> }` presentation parameter object.
pub(super) fn field_keys(action: &str, params: &Value) -> Result<Vec<FieldPath>, ActionError> {
    entries(action, params)?
        .keys()
        .map(|field| whole_field(action, parse_field(action, field)?))
        .collect()
}

fn entries<'p>(action: &str, params: &'p Value) -> Result<&'p Map<String, Value>, ActionError> {
    params.as_object().ok_or_else(|| ActionError::InvalidParams {
        action: action.to_owned(),
        message: "params must map field names to presentation values".to_owned(),
    })
}

fn for_each_entry(
    action: &str,
    params: &Value,
    form_def: &Value,
    ui_def: &mut Value,
    mut f: impl FnMut(&mut Map<String, Value>, String, &Value),
) -> Result<(), ActionError> {
    for (field, value) in entries(action, params)? {
        let path = whole_field(action, parse_field(action, field)?)?;
        let (owner, leaf) =
            ui_owner_mut(ui_def, form_def, &path, true).ok_or_else(|| ActionError::Failed {
                action: action.to_owned(),
                message: format!("presentation entry for '{field}' is not an object"),
            })?;
        f(owner, leaf, value);
    }
    Ok(())
}

/// Merge values into presentation entries: arrays gain missing elements,
/// class-style strings gain a missing space-separated token, objects merge
/// recursively, anything else is set.
pub(super) fn append(
    params: &Value,
    form_def: &Value,
    ui_def: &mut Value,
) -> Result<(), ActionError> {
    for_each_entry("uiAppend", params, form_def, ui_def, |owner, leaf, value| {
        match owner.get_mut(&leaf) {
            Some(existing) => merge_append(existing, value),
            None => {
                owner.insert(leaf, value.clone());
            }
        }
    })
}

fn merge_append(target: &mut Value, addition: &Value) {
    match (target, addition) {
        (Value::Array(existing), Value::Array(items)) => {
            for item in items {
                if !existing.contains(item) {
                    existing.push(item.clone());
                }
            }
        }
        (Value::Array(existing), item) => {
            if !existing.contains(item) {
                existing.push(item.clone());
            }
        }
        (Value::Object(existing), Value::Object(additions)) => {
            for (key, value) in additions {
                match existing.get_mut(key) {
                    Some(slot) => merge_append(slot, value),
                    None => {
                        existing.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::String(existing), Value::String(token)) => {
            if !existing.split_whitespace().any(|t| t == token) {
                if !existing.is_empty() {
                    existing.push(' ');
                }
                existing.push_str(token);
            }
        }
        (slot, _) => *slot = addition.clone(),
    }
}

/// Replace whole presentation entries.
pub(super) fn replace(
    params: &Value,
    form_def: &Value,
    ui_def: &mut Value,
) -> Result<(), ActionError> {
    for_each_entry("uiReplace", params, form_def, ui_def, |owner, leaf, value| {
        owner.insert(leaf, value.clone());
    })
}

/// Override individual properties of presentation entries, keeping the rest.
/// Nested objects are overridden key by key.
pub(super) fn override_props(
    params: &Value,
    form_def: &Value,
    ui_def: &mut Value,
) -> Result<(), ActionError> {
    for_each_entry("uiOverride", params, form_def, ui_def, |owner, leaf, value| {
        let entry = owner
            .entry(leaf)
            .or_insert_with(|| Value::Object(Map::new()));
        merge_override(entry, value);
    })
}

fn merge_override(target: &mut Value, overrides: &Value) {
    match (target, overrides) {
        (Value::Object(existing), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match existing.get_mut(key) {
                    Some(slot) => merge_override(slot, value),
                    None => {
                        existing.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, _) => *slot = overrides.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn append_to_class_names_and_arrays() {
        let mut ui = json!({
            "email": { "classNames": "wide", "ui:options": { "tags": ["a"] } }
        });
        append(
            &json!({ "email": { "classNames": "warn", "ui:options": { "tags": ["a", "b"] } } }),
            &json!({}),
            &mut ui,
        )
        .unwrap();
        assert_eq!(
            ui,
            json!({ "email": { "classNames": "wide warn", "ui:options": { "tags": ["a", "b"] } } })
        );
    }

    #[test]
    fn append_is_idempotent() {
        let mut ui = json!({ "email": { "classNames": "warn" } });
        let params = json!({ "email": { "classNames": "warn" } });
        append(&params, &json!({}), &mut ui).unwrap();
        append(&params, &json!({}), &mut ui).unwrap();
        assert_eq!(ui, json!({ "email": { "classNames": "warn" } }));
    }

    #[test]
    fn append_creates_missing_entry() {
        let mut ui = json!({});
        append(&json!({ "phone": { "ui:help": "optional" } }), &json!({}), &mut ui).unwrap();
        assert_eq!(ui, json!({ "phone": { "ui:help": "optional" } }));
    }

    #[test]
    fn replace_drops_previous_entry() {
        let mut ui = json!({ "email": { "classNames": "wide", "ui:widget": "text" } });
        replace(&json!({ "email": { "ui:widget": "hidden" } }), &json!({}), &mut ui).unwrap();
        assert_eq!(ui, json!({ "email": { "ui:widget": "hidden" } }));
    }

    #[test]
    fn override_keeps_untouched_props() {
        let mut ui = json!({ "email": { "classNames": "wide", "ui:widget": "text" } });
        override_props(&json!({ "email": { "ui:widget": "hidden" } }), &json!({}), &mut ui).unwrap();
        assert_eq!(
            ui,
            json!({ "email": { "classNames": "wide", "ui:widget": "hidden" } })
        );
    }

    #[test]
    fn override_descends_into_options() {
        let mut ui = json!({ "email": { "ui:options": { "rows": 3, "inline": true } } });
        override_props(&json!({ "email": { "ui:options": { "rows": 5 } } }), &json!({}), &mut ui).unwrap();
        assert_eq!(
            ui,
            json!({ "email": { "ui:options": { "rows": 5, "inline": true } } })
        );
    }

    #[test]
    fn nested_field_keys() {
        let mut ui = json!({});
        override_props(&json!({ "address.city": { "ui:disabled": true } }), &json!({}), &mut ui).unwrap();
        assert_eq!(ui, json!({ "address": { "city": { "ui:disabled": true } } }));
    }

    #[test]
    fn override_beside_child_named_items() {
        let schema = json!({
            "properties": {
                "order": {
                    "properties": {
                        "items": { "type": "array", "items": { "type": "string" } },
                        "note": { "type": "string" }
                    }
                }
            }
        });
        let mut ui = json!({ "order": { "items": { "ui:options": { "orderable": false } } } });
        override_props(&json!({ "order.note": { "ui:disabled": true } }), &schema, &mut ui).unwrap();
        assert_eq!(
            ui,
            json!({
                "order": {
                    "items": { "ui:options": { "orderable": false } },
                    "note": { "ui:disabled": true }
                }
            })
        );
    }

    #[test]
    fn array_row_fields_go_under_items() {
        let schema = json!({
            "properties": {
                "lines": { "type": "array", "items": { "properties": { "sku": {} } } }
            }
        });
        let mut ui = json!({});
        append(&json!({ "lines.sku": { "classNames": "mono" } }), &schema, &mut ui).unwrap();
        assert_eq!(ui, json!({ "lines": { "items": { "sku": { "classNames": "mono" } } } }));
    }

    #[test]
    fn element_reference_rejected() {
        let mut ui = json!({});
        let err = replace(&json!({ "tags[0]": {} }), &json!({}), &mut ui).unwrap_err();
        assert!(matches!(err, ActionError::InvalidParams { action, .. } if action == "uiReplace"));
        assert_eq!(ui, json!({}));
    }

    #[test]
    fn non_object_params_rejected() {
        let err = append(&json!(["email"]), &json!({}), &mut json!({})).unwrap_err();
        assert!(matches!(err, ActionError::InvalidParams { action, .. } if action == "uiAppend"));
    }
}
