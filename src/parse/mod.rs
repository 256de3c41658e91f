mod error;
mod grammar;

pub use error::ParseError;

use crate::types::FieldPath;

/// Parse a dotted/indexed field reference into a [`FieldPath`].
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid field reference.
pub fn parse_path(input: &str) -> Result<FieldPath, ParseError> {
    use winnow::Parser;
    grammar::field_path
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string()))
}
