use std::collections::btree_map::Entry;

use super::path::split_prop_path;
use super::path::tag_and_key;
use super::path::PATH_SEPARATOR;
use crate::MaterializeError;
use crate::PropMap;
use crate::PropValue;
use crate::Result;

/// Field identifying an element of an array-valued property when a path
/// segment carries an index tag.
pub(crate) const ARRAY_ELEMENT_KEY: &str = "key";

/// Rebuilds a nested property tree from flat `(path, value)` pairs.
///
/// Values are never dropped: a second value for an already populated key
/// turns it into an array holding both, later values are appended. The one
/// exception is an existing `Null`, which counts as unset and is replaced.
///
/// Index tags such as `device[key-1]` only steer traversal. The final
/// segment is always stored under its literal text, and a path without a
/// separator is a direct key even when it contains brackets.
#[derive(Debug, Default)]
pub struct PathMaterializer {
    root: PropMap,
}

impl PathMaterializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes one `(path, value)` pair into the tree.
    ///
    /// # Errors
    /// - [`MaterializeError::UnresolvedArrayElement`] if an index tag names an
    ///   element not present in the data received so far
    /// - [`MaterializeError::NotTraversable`] if an intermediate segment holds a scalar
    /// - [`MaterializeError::MalformedPath`] if the path cannot be parsed
    pub fn insert(
        &mut self,
        path: &str,
        val: PropValue,
    ) -> Result<()> {
        if !path.contains(PATH_SEPARATOR) {
            merge(&mut self.root, path, val);
            return Ok(());
        }

        let segments = split_prop_path(path)?;
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| MaterializeError::MalformedPath(path.to_string()))?;

        let mut node = &mut self.root;
        for segment in parents {
            node = descend(node, segment, path)?;
        }
        merge(node, last, val);
        Ok(())
    }

    pub fn tree(&self) -> &PropMap {
        &self.root
    }

    pub fn into_tree(self) -> PropMap {
        self.root
    }
}

/// Materializes a whole property list in encounter order.
pub fn materialize<I, S>(pairs: I) -> Result<PropMap>
where
    I: IntoIterator<Item = (S, PropValue)>,
    S: AsRef<str>,
{
    let mut materializer = PathMaterializer::new();
    for (path, val) in pairs {
        materializer.insert(path.as_ref(), val)?;
    }
    Ok(materializer.into_tree())
}

fn merge(
    node: &mut PropMap,
    key: &str,
    val: PropValue,
) {
    match node.entry(key.to_string()) {
        Entry::Vacant(slot) => {
            slot.insert(val);
        }
        Entry::Occupied(slot) => {
            let slot = slot.into_mut();
            if let PropValue::Array(items) = slot {
                items.push(val);
            } else if slot.is_null() {
                *slot = val;
            } else {
                let previous = std::mem::replace(slot, PropValue::Null);
                *slot = PropValue::Array(vec![previous, val]);
            }
        }
    }
}

fn descend<'a>(
    node: &'a mut PropMap,
    segment: &str,
    path: &str,
) -> Result<&'a mut PropMap> {
    let (key, tag) = tag_and_key(segment)?;

    let child = match tag {
        Some(tag) => find_element(node, key, tag, path)?,
        None => {
            let child = node.entry(key.to_string()).or_insert_with(PropValue::map);
            if child.is_null() {
                *child = PropValue::map();
            }
            child
        }
    };

    match child {
        PropValue::Map(map) => Ok(map),
        _ => Err(MaterializeError::NotTraversable {
            key: segment.to_string(),
            path: path.to_string(),
        }
        .into()),
    }
}

fn find_element<'a>(
    node: &'a mut PropMap,
    key: &str,
    tag: &str,
    path: &str,
) -> Result<&'a mut PropValue> {
    let unresolved = || MaterializeError::UnresolvedArrayElement {
        key: key.to_string(),
        tag: tag.to_string(),
        path: path.to_string(),
    };

    let Some(PropValue::Array(elements)) = node.get_mut(key) else {
        return Err(unresolved().into());
    };

    elements
        .iter_mut()
        .find(|element| element_matches(element, tag))
        .ok_or_else(|| unresolved().into())
}

fn element_matches(
    element: &PropValue,
    tag: &str,
) -> bool {
    element
        .get(ARRAY_ELEMENT_KEY)
        .and_then(PropValue::tag_text)
        .is_some_and(|text| text == tag)
}
