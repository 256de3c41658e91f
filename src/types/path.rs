use std::fmt;
use std::str::FromStr;

use super::error::PathError;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed field reference such as `address.city` or `items[0].name`.
///
/// Parsed by the grammar in [`crate::parse`]. Keys containing `.` or brackets
/// can be written as `['odd.key']`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub(crate) fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse a dotted/indexed field reference.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Syntax`] for malformed references.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        crate::parse::parse_path(input).map_err(|e| PathError::Syntax {
            input: input.to_owned(),
            message: e.to_string(),
        })
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The keys of the path with array indices dropped. Schema-side lookups
    /// descend through `items`, so indices carry no information there.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Key(key) => Some(key.as_str()),
            Segment::Index(_) => None,
        })
    }

    /// Whether the path addresses a single array element, as in `tags[0]`.
    #[must_use]
    pub fn ends_with_index(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Index(_)))
    }

    /// Split into the owning keys and the leaf key.
    #[must_use]
    pub fn split_leaf(&self) -> Option<(Vec<&str>, &str)> {
        let mut keys: Vec<&str> = self.keys().collect();
        let leaf = keys.pop()?;
        Some((keys, leaf))
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if key.contains(['.', '[', ']']) => write!(f, "['{key}']")?,
                Segment::Key(key) if i == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_skip_indices() {
        let path: FieldPath = "items[2].name".parse().unwrap();
        assert_eq!(path.keys().collect::<Vec<_>>(), vec!["items", "name"]);
    }

    #[test]
    fn split_leaf() {
        let path = FieldPath::parse("address.city").unwrap();
        let (parents, leaf) = path.split_leaf().unwrap();
        assert_eq!(parents, vec!["address"]);
        assert_eq!(leaf, "city");
    }

    #[test]
    fn trailing_index() {
        assert!(FieldPath::parse("tags[0]").unwrap().ends_with_index());
        assert!(!FieldPath::parse("items[0].name").unwrap().ends_with_index());
    }

    #[test]
    fn display_round_trips_shape() {
        let path = FieldPath::parse("items[0].name").unwrap();
        assert_eq!(path.to_string(), "items[0].name");
        let odd = FieldPath::from_segments(vec![Segment::Key("a.b".into())]);
        assert_eq!(odd.to_string(), "['a.b']");
    }

    #[test]
    fn syntax_error_names_input() {
        let err = FieldPath::parse("a..b").unwrap_err();
        assert!(matches!(err, PathError::Syntax { input, .. } if input == "a..b"));
    }
}
