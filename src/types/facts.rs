use serde_json::{Map, Value};

/// Current field → value snapshot tested against rules.
pub type Facts = Map<String, Value>;

/// Fact key under which the form data lives. Actions receive it separately
/// from the remaining facts.
pub const ENTITY: &str = "entity";

/// Build a fact base, dropping entries whose value is unknown.
///
/// An unknown value is not the same as `null` or `false`: rules must not see
/// the key at all.
pub fn sanitize_facts<K, I>(entries: I) -> Facts
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Option<Value>)>,
{
    entries
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.into(), v)))
        .collect()
}

/// Wrap form data as `{ "entity": data }`.
#[must_use]
pub fn entity_facts(form_data: Value) -> Facts {
    let mut facts = Facts::new();
    facts.insert(ENTITY.to_owned(), form_data);
    facts
}
