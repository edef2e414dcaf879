use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::ObjectRef;
use super::PropValue;

/// Opaque "last observed state" token handed back by `waitForUpdates`.
///
/// Never interpreted or compared by the client; only carried forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCursor(String);

impl VersionCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VersionCursor {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for VersionCursor {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token naming a server-side property filter. Valid only for the session
/// that created it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterHandle(String);

impl FilterHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `waitForUpdates` result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateBatch {
    pub version: Option<VersionCursor>,
    pub filter_set: Vec<FilterUpdate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterUpdate {
    pub filter: FilterHandle,
    pub object_set: Vec<ObjectUpdate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectUpdate {
    pub obj: ObjectRef,
    pub kind: UpdateKind,
    /// Empty for `leave`
    pub change_set: Vec<PropertyChange>,
}

/// Object update kind as reported by the service.
///
/// Unknown kinds are preserved so newer services can be tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateKind {
    Enter,
    Leave,
    Modify,
    Other(String),
}

impl From<&str> for UpdateKind {
    fn from(s: &str) -> Self {
        match s {
            "enter" => UpdateKind::Enter,
            "leave" => UpdateKind::Leave,
            "modify" => UpdateKind::Modify,
            other => UpdateKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            UpdateKind::Enter => f.write_str("enter"),
            UpdateKind::Leave => f.write_str("leave"),
            UpdateKind::Modify => f.write_str("modify"),
            UpdateKind::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeOp {
    Add,
    Remove,
    Assign,
    IndirectRemove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    /// Property path, dotted and possibly index-tagged
    pub name: String,
    pub op: ChangeOp,
    pub val: PropValue,
}

impl PropertyChange {
    pub fn assign(
        name: impl Into<String>,
        val: impl Into<PropValue>,
    ) -> Self {
        Self {
            name: name.into(),
            op: ChangeOp::Assign,
            val: val.into(),
        }
    }
}

/// Flat path → value map built from one object's change set.
pub type ChangedProperties = HashMap<String, PropValue>;

/// One object's row in a `retrieveProperties` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectContent {
    pub obj: ObjectRef,
    pub prop_set: Vec<DynamicProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicProperty {
    pub name: String,
    pub val: PropValue,
}

impl DynamicProperty {
    pub fn new(
        name: impl Into<String>,
        val: impl Into<PropValue>,
    ) -> Self {
        Self {
            name: name.into(),
            val: val.into(),
        }
    }
}
