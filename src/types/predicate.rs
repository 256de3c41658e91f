use std::collections::BTreeMap;
use std::fmt;
use std::ops::Not;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use super::error::ConditionError;
use super::value::{compare, is_empty, is_truthy, length, loose_eq};

/// Signature of a caller-registered predicate: `(value, argument) -> bool`.
pub type PredicateFn = Arc<dyn Fn(&Value, Option<&Value>) -> bool + Send + Sync>;

/// Maps a value before a nested table's predicates see it.
pub type Projection = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Which side of the predicate vocabulary is consulted.
///
/// `not` in a condition tree swaps the polarity for its subtree. Under
/// [`Polarity::Negative`] every leaf predicate reports the inverse of its
/// positive result; composed conditions are *not* negated as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    #[default]
    Positive,
    Negative,
}

impl Not for Polarity {
    type Output = Polarity;

    fn not(self) -> Polarity {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }
}

/// Built-in predicates, dispatched without name lookup once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Empty,
    Exists,
    Null,
    Truthy,
    Falsey,
    String,
    Number,
    Boolean,
    Array,
    Object,
    Equal,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    /// Inclusive range check against a `[low, high]` argument.
    Between,
    /// Membership in an array argument.
    In,
    Contains,
    StartsWith,
    EndsWith,
    /// Regular-expression match of a string value.
    Matches,
    Odd,
    Even,
    Positive,
    Negative,
    Zero,
}

const BUILTIN_NAMES: &[(&str, Builtin)] = &[
    ("empty", Builtin::Empty),
    ("exists", Builtin::Exists),
    ("null", Builtin::Null),
    ("truthy", Builtin::Truthy),
    ("falsey", Builtin::Falsey),
    ("string", Builtin::String),
    ("number", Builtin::Number),
    ("boolean", Builtin::Boolean),
    ("array", Builtin::Array),
    ("object", Builtin::Object),
    ("equal", Builtin::Equal),
    ("equals", Builtin::Equal),
    ("eq", Builtin::Equal),
    ("greater", Builtin::Greater),
    ("greaterThan", Builtin::Greater),
    ("gt", Builtin::Greater),
    ("greaterEq", Builtin::GreaterEq),
    ("greaterThanOrEqual", Builtin::GreaterEq),
    ("ge", Builtin::GreaterEq),
    ("less", Builtin::Less),
    ("lessThan", Builtin::Less),
    ("lt", Builtin::Less),
    ("lessEq", Builtin::LessEq),
    ("lessThanOrEqual", Builtin::LessEq),
    ("le", Builtin::LessEq),
    ("between", Builtin::Between),
    ("in", Builtin::In),
    ("contains", Builtin::Contains),
    ("startsWith", Builtin::StartsWith),
    ("endsWith", Builtin::EndsWith),
    ("matches", Builtin::Matches),
    ("odd", Builtin::Odd),
    ("even", Builtin::Even),
    ("positive", Builtin::Positive),
    ("negative", Builtin::Negative),
    ("zero", Builtin::Zero),
];

impl Builtin {
    /// Apply the predicate with positive polarity.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError::InvalidArgument`] when the argument has the
    /// wrong shape for this predicate (e.g. `in` without an array).
    pub fn apply(self, value: &Value, arg: Option<&Value>) -> Result<bool, ConditionError> {
        let arg_or_null = arg.unwrap_or(&Value::Null);
        let ordering = || compare(value, arg_or_null);
        let number = || value.as_f64();
        Ok(match self {
            Builtin::Empty => is_empty(value),
            Builtin::Exists => !value.is_null(),
            Builtin::Null => value.is_null(),
            Builtin::Truthy => is_truthy(value),
            Builtin::Falsey => !is_truthy(value),
            Builtin::String => value.is_string(),
            Builtin::Number => value.is_number(),
            Builtin::Boolean => value.is_boolean(),
            Builtin::Array => value.is_array(),
            Builtin::Object => value.is_object(),
            Builtin::Equal => loose_eq(value, arg_or_null),
            Builtin::Greater => ordering().is_some_and(|o| o.is_gt()),
            Builtin::GreaterEq => ordering().is_some_and(|o| o.is_ge()),
            Builtin::Less => ordering().is_some_and(|o| o.is_lt()),
            Builtin::LessEq => ordering().is_some_and(|o| o.is_le()),
            Builtin::Between => match arg_or_null.as_array().map(Vec::as_slice) {
                Some([low, high]) => {
                    compare(value, low).is_some_and(|o| o.is_ge())
                        && compare(value, high).is_some_and(|o| o.is_le())
                }
                _ => return Err(self.invalid("expected a [low, high] array")),
            },
            Builtin::In => match arg_or_null {
                Value::Array(options) => options.iter().any(|option| loose_eq(value, option)),
                _ => return Err(self.invalid("expected an array")),
            },
            Builtin::Contains => match value {
                Value::String(s) => arg_or_null.as_str().is_some_and(|needle| s.contains(needle)),
                Value::Array(items) => items.iter().any(|item| loose_eq(item, arg_or_null)),
                _ => false,
            },
            Builtin::StartsWith => match (value.as_str(), arg_or_null.as_str()) {
                (Some(s), Some(prefix)) => s.starts_with(prefix),
                _ => false,
            },
            Builtin::EndsWith => match (value.as_str(), arg_or_null.as_str()) {
                (Some(s), Some(suffix)) => s.ends_with(suffix),
                _ => false,
            },
            Builtin::Matches => {
                let Some(pattern) = arg_or_null.as_str() else {
                    return Err(self.invalid("expected a pattern string"));
                };
                let re = Regex::new(pattern).map_err(|e| self.invalid(&e.to_string()))?;
                value.as_str().is_some_and(|s| re.is_match(s))
            }
            Builtin::Odd => parity(value) == Some(true),
            Builtin::Even => parity(value) == Some(false),
            Builtin::Positive => number().is_some_and(|n| n > 0.0),
            Builtin::Negative => number().is_some_and(|n| n < 0.0),
            Builtin::Zero => number().is_some_and(|n| n == 0.0),
        })
    }

    fn name(self) -> &'static str {
        BUILTIN_NAMES
            .iter()
            .find(|(_, builtin)| *builtin == self)
            .map_or("?", |(name, _)| *name)
    }

    fn invalid(self, message: &str) -> ConditionError {
        ConditionError::InvalidArgument {
            name: self.name().to_owned(),
            message: message.to_owned(),
        }
    }
}

/// `Some(true)` for odd integral numbers, `Some(false)` for even ones.
/// `3.0` counts as an integer; `2.5` has no parity.
fn parity(value: &Value) -> Option<bool> {
    match value.as_i64() {
        Some(n) => Some(n % 2 != 0),
        None => value
            .as_f64()
            .filter(|n| n.fract() == 0.0)
            .map(|n| n % 2.0 != 0.0),
    }
}

/// A nested vocabulary reached through a composing key such as `length`.
#[derive(Clone)]
pub struct NestedTable {
    table: Arc<PredicateTable>,
    projection: Option<Projection>,
}

/// One name in a [`PredicateTable`].
#[derive(Clone)]
pub enum PredicateEntry {
    Builtin(Builtin),
    Custom(PredicateFn),
    Nested(NestedTable),
}

impl fmt::Debug for PredicateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateEntry::Builtin(b) => write!(f, "Builtin({b:?})"),
            PredicateEntry::Custom(_) => write!(f, "Custom(..)"),
            PredicateEntry::Nested(nested) => write!(f, "Nested({:?})", nested.table),
        }
    }
}

/// Name-keyed predicate vocabulary.
///
/// The built-in vocabulary is a fixed enum dispatch table; callers extend it
/// by registering custom predicates or nested tables. Looking up a name that
/// was never registered is an error, never a silent `false`.
///
/// # Example
///
/// ```
/// use form_rules::PredicateTable;
/// use serde_json::Value;
/// use std::sync::Arc;
///
/// let table = PredicateTable::builtin().predicate(
///     "shout",
///     Arc::new(|v: &Value, _: Option<&Value>| v.as_str().is_some_and(|s| s.ends_with('!'))),
/// );
/// assert!(table.get("shout").is_some());
/// assert!(table.get("length").is_some());
/// ```
#[derive(Clone, Default)]
pub struct PredicateTable {
    entries: BTreeMap<String, PredicateEntry>,
}

impl PredicateTable {
    /// An empty vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in vocabulary, including the `length` composition table.
    #[must_use]
    pub fn builtin() -> Self {
        let leaves = Self::builtin_leaves();
        let projection: Projection =
            Arc::new(|v: &Value| length(v).map_or(Value::Null, Value::from));
        leaves.clone().table("length", leaves, Some(projection))
    }

    fn builtin_leaves() -> Self {
        let entries = BUILTIN_NAMES
            .iter()
            .map(|(name, builtin)| ((*name).to_owned(), PredicateEntry::Builtin(*builtin)))
            .collect();
        Self { entries }
    }

    /// Register a custom predicate, replacing any entry with the same name.
    #[must_use]
    pub fn predicate(mut self, name: &str, f: PredicateFn) -> Self {
        self.insert(name, PredicateEntry::Custom(f));
        self
    }

    /// Register a nested table reachable under `name`.
    #[must_use]
    pub fn table(mut self, name: &str, table: PredicateTable, projection: Option<Projection>) -> Self {
        self.insert(
            name,
            PredicateEntry::Nested(NestedTable {
                table: Arc::new(table),
                projection,
            }),
        );
        self
    }

    /// Insert an entry (mutable reference version).
    pub fn insert(&mut self, name: &str, entry: PredicateEntry) {
        self.entries.insert(name.to_owned(), entry);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PredicateEntry> {
        self.entries.get(name)
    }
}

impl fmt::Debug for PredicateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PredicateTable({} entries)", self.entries.len())
    }
}

/// The table currently consulted during evaluation, together with its polarity.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    table: &'a PredicateTable,
    polarity: Polarity,
}

impl<'a> Scope<'a> {
    #[must_use]
    pub fn new(table: &'a PredicateTable, polarity: Polarity) -> Self {
        Self { table, polarity }
    }

    #[must_use]
    pub fn positive(table: &'a PredicateTable) -> Self {
        Self::new(table, Polarity::Positive)
    }

    #[must_use]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Same table, opposite polarity.
    #[must_use]
    pub fn negated(self) -> Self {
        Self::new(self.table, !self.polarity)
    }

    /// Descend into the nested table registered under `name`, keeping polarity.
    pub(crate) fn nested(
        self,
        name: &str,
    ) -> Result<(Scope<'a>, Option<&'a Projection>), ConditionError> {
        match self.lookup(name)? {
            PredicateEntry::Nested(nested) => Ok((
                Scope::new(&nested.table, self.polarity),
                nested.projection.as_ref(),
            )),
            PredicateEntry::Builtin(_) | PredicateEntry::Custom(_) => {
                Err(ConditionError::NotATable {
                    name: name.to_owned(),
                })
            }
        }
    }

    /// Apply the predicate `name` under this scope's polarity.
    pub(crate) fn test(
        self,
        name: &str,
        value: &Value,
        arg: Option<&Value>,
    ) -> Result<bool, ConditionError> {
        let positive = match self.lookup(name)? {
            PredicateEntry::Builtin(builtin) => builtin.apply(value, arg)?,
            PredicateEntry::Custom(f) => f(value, arg),
            PredicateEntry::Nested(_) => {
                return Err(ConditionError::NotAPredicate {
                    name: name.to_owned(),
                })
            }
        };
        Ok(match self.polarity {
            Polarity::Positive => positive,
            Polarity::Negative => !positive,
        })
    }

    fn lookup(self, name: &str) -> Result<&'a PredicateEntry, ConditionError> {
        self.table
            .get(name)
            .ok_or_else(|| ConditionError::UnknownPredicate {
                name: name.to_owned(),
            })
    }
}
