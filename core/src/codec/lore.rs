//! Lore line grammar.
//!
//! ```text
//!   line    = prefix name ' ' numeral
//!   name    = word (' ' word)*        word = [A-Za-z0-9_]+
//!   numeral = [IVXLCDM]+               (canonical, 1..=3999)
//! ```
//!
//! Matching is whole-line. A line that has the prefix and a name but whose
//! last token is not made of numeral letters is foreign text, not a tag.
//! The numeral is only decoded once the name is known to be registered, so
//! `IIII` after a registered name is a [`DecodeError`] while foreign text
//! that happens to end in numeral letters is merely unknown.

use enchantry_types::numerals::{from_roman, is_numeral_char};

use crate::error::DecodeError;

/// Whether `name` can be written as a tag and read back: one or more
/// words of `[A-Za-z0-9_]` separated by spaces.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(' ')
        && !name.ends_with(' ')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ')
}

/// Split a line into `(name, numeral)` if it has the shape of a tag.
pub(crate) fn match_tag<'a>(prefix: &str, line: &'a str) -> Option<(&'a str, &'a str)> {
    let body = line.strip_prefix(prefix)?;
    let (name, numeral) = body.rsplit_once(' ')?;
    if !is_valid_name(name) {
        return None;
    }
    if numeral.is_empty() || !numeral.chars().all(is_numeral_char) {
        return None;
    }
    Some((name, numeral))
}

/// Level encoded by the numeral of a tag line.
pub(crate) fn parse_level(line: &str, numeral: &str) -> Result<u32, DecodeError> {
    from_roman(numeral).map_err(|source| DecodeError::Numeral {
        line: line.to_string(),
        source,
    })
}

pub(crate) fn is_tag(prefix: &str, line: &str) -> bool {
    match_tag(prefix, line).is_some()
}

/// Tag lines first in lexicographic order, then every other line in its
/// original relative order.
pub(crate) fn sort_lore(prefix: &str, lore: Vec<String>) -> Vec<String> {
    let (mut tags, rest): (Vec<String>, Vec<String>) =
        lore.into_iter().partition(|l| is_tag(prefix, l));
    tags.sort();
    tags.extend(rest);
    tags
}
