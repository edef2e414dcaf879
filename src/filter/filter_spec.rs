use serde::Deserialize;
use serde::Serialize;

use super::PathSpec;
use super::PropertyMap;
use crate::ObjectRef;

/// Selection of the objects a filter watches: the root objects plus the
/// traversal rules leading from them to the rest of the inventory.
///
/// Supplied by the caller and passed to the service untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTraversalSpec {
    pub object_set: Vec<ObjectSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub obj: ObjectRef,
    /// Report only objects reached through `select_set`, not `obj` itself
    pub skip: bool,
    pub select_set: Vec<SelectionSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionSpec {
    /// Reference to a traversal spec declared elsewhere by name
    Named(String),
    Traversal(TraversalSpec),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalSpec {
    pub name: String,
    pub type_name: String,
    pub path: String,
    pub skip: bool,
    pub select_set: Vec<SelectionSpec>,
}

impl ObjectTraversalSpec {
    /// Watches exactly one object.
    pub fn single(obj: ObjectRef) -> Self {
        Self {
            object_set: vec![ObjectSpec {
                obj,
                skip: false,
                select_set: Vec::new(),
            }],
        }
    }
}

/// Per-type property selection of a filter request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub type_name: String,
    /// Request every property of the type; `path_set` is empty then
    pub all: bool,
    pub path_set: Vec<String>,
}

/// Subscription / query request understood by the property collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyFilterSpec {
    pub prop_set: Vec<PropertySpec>,
    pub object_set: ObjectTraversalSpec,
}

/// Builds [`PropertyFilterSpec`]s. Pure, never fails.
pub struct FilterSpecBuilder;

impl FilterSpecBuilder {
    /// Subscription request covering every type of `map` over `traversal`.
    pub fn build(
        map: &PropertyMap,
        traversal: &ObjectTraversalSpec,
    ) -> PropertyFilterSpec {
        let prop_set = map
            .iter()
            .map(|(ty, spec)| match spec {
                PathSpec::AllProperties => PropertySpec {
                    type_name: ty.to_string(),
                    all: true,
                    path_set: Vec::new(),
                },
                PathSpec::Paths(paths) => PropertySpec {
                    type_name: ty.to_string(),
                    all: false,
                    path_set: paths.clone(),
                },
            })
            .collect();

        PropertyFilterSpec {
            prop_set,
            object_set: traversal.clone(),
        }
    }

    /// One-shot query scoped to `obj`: all properties when `path` is `None`,
    /// otherwise just `path`.
    pub fn for_object(
        obj: &ObjectRef,
        path: Option<&str>,
    ) -> PropertyFilterSpec {
        let spec = match path {
            None => PropertySpec {
                type_name: obj.type_name.clone(),
                all: true,
                path_set: Vec::new(),
            },
            Some(path) => PropertySpec {
                type_name: obj.type_name.clone(),
                all: false,
                path_set: vec![path.to_string()],
            },
        };

        PropertyFilterSpec {
            prop_set: vec![spec],
            object_set: ObjectTraversalSpec::single(obj.clone()),
        }
    }
}
