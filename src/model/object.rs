use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Reference to a managed object on the service: its type name plus the
/// service-assigned identifier (e.g. `VirtualMachine:vm-42`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub type_name: String,
    pub value: String,
}

impl ObjectRef {
    pub fn new(
        type_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.value)
    }
}

/// Well-known endpoints of a connected session, obtained from the
/// connection layer when the session is established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceContent {
    /// Property-collector endpoint that owns filters and update waits
    pub property_collector: ObjectRef,
    /// Root of the managed-object tree
    pub root_folder: ObjectRef,
    /// Session manager, queried for `currentSession` by the liveness probe
    pub session_manager: ObjectRef,
}
