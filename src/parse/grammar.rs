use winnow::ascii::dec_uint;
use winnow::combinator::{alt, cut_err, delimited, preceded, repeat};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

use crate::types::{FieldPath, Segment};

// -- Segments ---------------------------------------------------------------

fn bare_key(input: &mut &str) -> ModalResult<Segment> {
    take_while(1.., |c: char| c != '.' && c != '[' && c != ']')
        .map(|key: &str| Segment::Key(key.to_owned()))
        .context(StrContext::Expected(StrContextValue::Description(
            "field name",
        )))
        .parse_next(input)
}

fn quoted_key(input: &mut &str) -> ModalResult<Segment> {
    delimited("['", take_till(0.., '\''), cut_err("']"))
        .map(|key: &str| Segment::Key(key.to_owned()))
        .parse_next(input)
}

fn index(input: &mut &str) -> ModalResult<Segment> {
    delimited('[', dec_uint::<_, usize, _>, cut_err(']'))
        .map(Segment::Index)
        .context(StrContext::Expected(StrContextValue::Description(
            "array index",
        )))
        .parse_next(input)
}

fn bracketed(input: &mut &str) -> ModalResult<Segment> {
    alt((quoted_key, index)).parse_next(input)
}

// -- Paths ------------------------------------------------------------------

fn tail(input: &mut &str) -> ModalResult<Segment> {
    alt((preceded('.', cut_err(bare_key)), bracketed)).parse_next(input)
}

pub(super) fn field_path(input: &mut &str) -> ModalResult<FieldPath> {
    let first = alt((bracketed, bare_key)).parse_next(input)?;
    let rest: Vec<Segment> = repeat(0.., tail).parse_next(input)?;
    let mut segments = Vec::with_capacity(rest.len() + 1);
    segments.push(first);
    segments.extend(rest);
    Ok(FieldPath::from_segments(segments))
}
