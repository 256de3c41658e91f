use thiserror::Error;

use crate::parse::ParseError;
use crate::runner::RunError;
use crate::{ActionError, ConditionError, EngineError, PathError};

/// Unified error type covering every failure the crate can report.
///
/// Returned by convenience methods like [`Rule::from_file()`](crate::Rule::from_file);
/// each component's own error converts into it with `?`.
#[derive(Debug, Error)]
pub enum FormRulesError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Condition(#[from] ConditionError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
