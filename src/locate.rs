//! Path resolution into form definitions, presentation definitions and facts.
//!
//! Every mutating action resolves its field reference through these helpers:
//! they return the container that owns the field and the leaf key, so
//! actions never walk documents on their own.

use serde_json::{Map, Value};

use crate::{Facts, FieldPath, PathError, Segment};

/// Upper bound on chained `$ref` hops before a chain is treated as cyclic.
const MAX_REF_HOPS: usize = 32;

/// Presentation key holding an explicit field order.
pub const UI_ORDER: &str = "ui:order";

/// JSON-pointer to the schema object that owns `path`'s leaf, plus the leaf.
///
/// Descends through `properties`, through `items` of array schemas, and
/// through local `$ref`s (`#/definitions/...`).
///
/// # Errors
///
/// Returns [`PathError::UnknownField`] when an intermediate field is not
/// declared, or a `$ref` error when a reference cannot be followed.
pub fn schema_owner(schema: &Value, path: &FieldPath) -> Result<(String, String), PathError> {
    let unknown = || PathError::UnknownField {
        field: path.to_string(),
    };
    let (parents, leaf) = path.split_leaf().ok_or_else(unknown)?;

    let mut pointer = resolve_refs(schema, String::new())?;
    for key in parents {
        let node = schema.pointer(&pointer).ok_or_else(unknown)?;
        if node.pointer(&format!("/properties/{}", escape(key))).is_none() {
            return Err(unknown());
        }
        pointer = resolve_refs(schema, format!("{pointer}/properties/{}", escape(key)))?;
        if schema.pointer(&format!("{pointer}/items")).is_some() {
            pointer = resolve_refs(schema, format!("{pointer}/items"))?;
        }
    }
    Ok((pointer, leaf.to_owned()))
}

/// Mutable schema object owning `path`'s leaf, plus the leaf.
///
/// # Errors
///
/// See [`schema_owner`].
pub fn schema_owner_mut<'a>(
    schema: &'a mut Value,
    path: &FieldPath,
) -> Result<(&'a mut Map<String, Value>, String), PathError> {
    let (pointer, leaf) = schema_owner(schema, path)?;
    let owner = schema
        .pointer_mut(&pointer)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| PathError::UnknownField {
            field: path.to_string(),
        })?;
    Ok((owner, leaf))
}

/// Whether `path` is declared under the owning schema's `properties`.
#[must_use]
pub fn schema_declares(schema: &Value, path: &FieldPath) -> bool {
    schema_owner(schema, path).is_ok_and(|(pointer, leaf)| {
        schema
            .pointer(&format!("{pointer}/properties/{}", escape(&leaf)))
            .is_some()
    })
}

fn resolve_refs(schema: &Value, mut pointer: String) -> Result<String, PathError> {
    for _ in 0..MAX_REF_HOPS {
        let Some(reference) = schema
            .pointer(&pointer)
            .and_then(|node| node.get("$ref"))
            .and_then(Value::as_str)
        else {
            return Ok(pointer);
        };
        let target = reference
            .strip_prefix('#')
            .filter(|target| schema.pointer(target).is_some())
            .ok_or_else(|| PathError::UnresolvedRef {
                reference: reference.to_owned(),
            })?;
        pointer = target.to_owned();
    }
    Err(PathError::RefCycle { reference: pointer })
}

fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Presentation object owning `path`'s leaf, plus the leaf.
///
/// Nested entries are reached by key. Where the form definition declares a
/// parent as an array, its presentation entry is descended through `items`;
/// an entry that merely has a child field called `items` is not. With
/// `create`, missing intermediate entries are inserted as empty objects;
/// otherwise a missing entry yields `None` (there is nothing to mutate).
pub fn ui_owner_mut<'a>(
    ui: &'a mut Value,
    schema: &Value,
    path: &FieldPath,
    create: bool,
) -> Option<(&'a mut Map<String, Value>, String)> {
    let (parents, leaf) = path.split_leaf()?;
    let arrays = array_parents(schema, &parents);
    let mut node = ui;
    for (key, is_array) in parents.into_iter().zip(arrays) {
        let map = node.as_object_mut()?;
        if create && !map.contains_key(key) {
            map.insert(key.to_owned(), Value::Object(Map::new()));
        }
        let child = map.get_mut(key)?;
        node = if is_array {
            if create && child.get("items").is_none() {
                child
                    .as_object_mut()?
                    .insert("items".to_owned(), Value::Object(Map::new()));
            }
            child.get_mut("items")?
        } else {
            child
        };
    }
    Some((node.as_object_mut()?, leaf.to_owned()))
}

/// For each parent key, whether the form definition declares that field as
/// an array. Undeclared fields count as objects.
fn array_parents(schema: &Value, parents: &[&str]) -> Vec<bool> {
    let mut flags = Vec::with_capacity(parents.len());
    let mut pointer = resolve_refs(schema, String::new()).ok();
    for key in parents {
        let field = pointer.and_then(|owner| {
            let field = format!("{owner}/properties/{}", escape(key));
            schema.pointer(&field)?;
            resolve_refs(schema, field).ok()
        });
        let is_array = field
            .as_ref()
            .is_some_and(|field| schema.pointer(&format!("{field}/items")).is_some());
        pointer = if is_array {
            field.and_then(|field| resolve_refs(schema, format!("{field}/items")).ok())
        } else {
            field
        };
        flags.push(is_array);
    }
    flags
}

/// Look up a fact by exact key, falling back to a dotted/indexed path.
#[must_use]
pub fn lookup<'a>(facts: &'a Facts, key: &str) -> Option<&'a Value> {
    if let Some(value) = facts.get(key) {
        return Some(value);
    }
    let path = FieldPath::parse(key).ok()?;
    let (first, rest) = path.segments().split_first()?;
    let Segment::Key(first) = first else {
        return None;
    };
    rest.iter()
        .try_fold(facts.get(first)?, |node, segment| match segment {
            Segment::Key(key) => match node {
                Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => node.get(key.as_str()),
            },
            Segment::Index(i) => node.get(*i),
        })
}

/// Remove the value at `path` from a data tree.
///
/// A key segment that meets an array is applied to every element, so
/// `items.name` clears `name` from each row; an explicit index targets one
/// element. Removing an array element leaves `null` in its slot so sibling
/// indices stay stable. Missing paths are a no-op.
pub fn unset(data: &mut Value, path: &FieldPath) {
    unset_segments(data, path.segments());
}

fn unset_segments(node: &mut Value, segments: &[Segment]) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };
    match (node, segment) {
        (Value::Object(map), Segment::Key(key)) => {
            if rest.is_empty() {
                map.remove(key);
            } else if let Some(child) = map.get_mut(key) {
                unset_segments(child, rest);
            }
        }
        (Value::Array(items), Segment::Key(key)) => match key.parse::<usize>() {
            Ok(i) => unset_index(items, i, rest),
            Err(_) => items
                .iter_mut()
                .for_each(|item| unset_segments(item, segments)),
        },
        (Value::Array(items), Segment::Index(i)) => unset_index(items, *i, rest),
        _ => {}
    }
}

fn unset_index(items: &mut [Value], i: usize, rest: &[Segment]) {
    let Some(item) = items.get_mut(i) else {
        return;
    };
    if rest.is_empty() {
        *item = Value::Null;
    } else {
        unset_segments(item, rest);
    }
}
