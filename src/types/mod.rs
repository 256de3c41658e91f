mod error;
mod facts;
mod mode;
mod path;
mod predicate;
mod rule;
pub(crate) mod value;

pub use error::{ActionError, ConditionError, EngineError, PathError};
pub use facts::{entity_facts, sanitize_facts, Facts, ENTITY};
pub use mode::ErrorMode;
pub use path::{FieldPath, Segment};
pub use predicate::{
    Builtin, NestedTable, Polarity, PredicateEntry, PredicateFn, PredicateTable, Projection, Scope,
};
pub use rule::{Action, OneOrMany, Rule};
