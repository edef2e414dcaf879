use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use super::ObjectRef;

/// Nested mapping node of a property tree.
pub type PropMap = BTreeMap<String, PropValue>;

/// Tagged value union carried by property changes and snapshot nodes.
///
/// The service returns scalars, arrays or nested data objects depending on
/// the property path, so every consumer works on this union rather than on a
/// fixed shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropValue {
    /// Explicit absence, e.g. the value of a `remove` change
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Reference to another managed object
    ManagedObject(ObjectRef),
    Array(Vec<PropValue>),
    Map(PropMap),
}

impl PropValue {
    /// Empty mapping node
    pub fn map() -> Self {
        PropValue::Map(PropMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&PropMap> {
        match self {
            PropValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PropValue]> {
        match self {
            PropValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Looks up a direct child of a mapping node.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&PropValue> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Renders a scalar the way the service renders it inside an index tag,
    /// e.g. `device[4000]` or `device["key-1"]`.
    pub(crate) fn tag_text(&self) -> Option<String> {
        match self {
            PropValue::String(s) => Some(s.clone()),
            PropValue::Int(i) => Some(i.to_string()),
            PropValue::Bool(b) => Some(b.to_string()),
            PropValue::ManagedObject(o) => Some(o.value.clone()),
            _ => None,
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::String(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::String(s)
    }
}

impl From<i64> for PropValue {
    fn from(i: i64) -> Self {
        PropValue::Int(i)
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<f64> for PropValue {
    fn from(f: f64) -> Self {
        PropValue::Float(f)
    }
}

impl From<ObjectRef> for PropValue {
    fn from(o: ObjectRef) -> Self {
        PropValue::ManagedObject(o)
    }
}

impl From<Vec<PropValue>> for PropValue {
    fn from(v: Vec<PropValue>) -> Self {
        PropValue::Array(v)
    }
}

impl From<PropMap> for PropValue {
    fn from(m: PropMap) -> Self {
        PropValue::Map(m)
    }
}

impl<K: Into<String>, V: Into<PropValue>> FromIterator<(K, V)> for PropValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        PropValue::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
