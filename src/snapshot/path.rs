//! Property path parsing.
//!
//! A path is a `.` separated list of segments. A segment may carry an index
//! tag selecting one element of an array-valued property, e.g.
//! `config.hardware.device[4000].backing` or `device["key-1"]`. Separators
//! inside a tag do not split the path.

use crate::MaterializeError;
use crate::Result;

pub(crate) const PATH_SEPARATOR: char = '.';

/// Splits a property path into its segments, keeping index tags intact.
pub(crate) fn split_prop_path(path: &str) -> Result<Vec<&str>> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0usize;

    for (i, c) in path.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') if depth > 0 => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| MaterializeError::MalformedPath(path.to_string()))?;
            }
            (None, PATH_SEPARATOR) if depth == 0 => {
                segments.push(&path[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    if depth != 0 || quote.is_some() {
        return Err(MaterializeError::MalformedPath(path.to_string()).into());
    }
    segments.push(&path[start..]);

    if segments.iter().any(|s| s.is_empty()) {
        return Err(MaterializeError::MalformedPath(path.to_string()).into());
    }
    Ok(segments)
}

/// Splits one segment into its property key and optional index tag.
///
/// `device[4000]` -> (`device`, Some("4000")), `device["a.b"]` -> (`device`, Some("a.b")),
/// `runtime` -> (`runtime`, None)
pub(crate) fn tag_and_key(segment: &str) -> Result<(&str, Option<&str>)> {
    let Some(open) = segment.find('[') else {
        return Ok((segment, None));
    };

    let key = &segment[..open];
    if key.is_empty() || !segment.ends_with(']') {
        return Err(MaterializeError::MalformedPath(segment.to_string()).into());
    }

    let tag = &segment[open + 1..segment.len() - 1];
    Ok((key, Some(unquote(tag))))
}

fn unquote(tag: &str) -> &str {
    for q in ['"', '\''] {
        if tag.len() >= 2 && tag.starts_with(q) && tag.ends_with(q) {
            return &tag[1..tag.len() - 1];
        }
    }
    tag
}

/// Every dotted prefix of `path`, shortest first, ending with `path` itself.
pub(crate) fn path_prefixes(path: &str) -> Result<Vec<String>> {
    let segments = split_prop_path(path)?;
    let mut prefixes = Vec::with_capacity(segments.len());
    let mut current = String::new();
    for segment in segments {
        if !current.is_empty() {
            current.push(PATH_SEPARATOR);
        }
        current.push_str(segment);
        prefixes.push(current.clone());
    }
    Ok(prefixes)
}
