use thiserror::Error;

/// Errors raised while interpreting a condition tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("unknown predicate '{name}'")]
    UnknownPredicate { name: String },

    #[error("predicate '{name}' is not a nested table and cannot take an object argument")]
    NotATable { name: String },

    #[error("'{name}' is a nested table and cannot be applied as a predicate")]
    NotAPredicate { name: String },

    #[error("invalid argument for predicate '{name}': {message}")]
    InvalidArgument { name: String, message: String },

    #[error("malformed condition: {message}")]
    Malformed { message: String },
}

/// Errors raised while resolving a field reference inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("invalid field reference '{input}': {message}")]
    Syntax { input: String, message: String },

    #[error("field '{field}' is not defined in the form definition")]
    UnknownField { field: String },

    #[error("unresolvable reference '{reference}'")]
    UnresolvedRef { reference: String },

    #[error("reference chain starting at '{reference}' does not terminate")]
    RefCycle { reference: String },
}

/// Errors raised while validating or dispatching an action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("unknown action '{kind}'")]
    UnknownAction { kind: String },

    #[error("invalid params for action '{action}': {message}")]
    InvalidParams { action: String, message: String },

    #[error("action '{action}' failed: {source}")]
    Path {
        action: String,
        #[source]
        source: PathError,
    },

    #[error("action '{action}' failed: {message}")]
    Failed { action: String, message: String },
}

/// Errors raised by a rule-firing engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Condition(#[from] ConditionError),

    #[error("engine failure: {0}")]
    Failed(String),
}
