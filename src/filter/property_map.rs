use std::collections::BTreeMap;
use std::fmt;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::snapshot::path::path_prefixes;
use crate::snapshot::path::split_prop_path;
use crate::Error;
use crate::Result;

/// Managed object type tag used as the key of a [`PropertyMap`].
///
/// Well-known inventory types are named; anything else is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ManagedObjectType {
    VirtualMachine,
    HostSystem,
    Datastore,
    Folder,
    Datacenter,
    ClusterComputeResource,
    ComputeResource,
    ResourcePool,
    VirtualApp,
    Network,
    DistributedVirtualPortgroup,
    VmwareDistributedVirtualSwitch,
    SessionManager,
    Other(String),
}

impl ManagedObjectType {
    pub fn as_str(&self) -> &str {
        match self {
            ManagedObjectType::VirtualMachine => "VirtualMachine",
            ManagedObjectType::HostSystem => "HostSystem",
            ManagedObjectType::Datastore => "Datastore",
            ManagedObjectType::Folder => "Folder",
            ManagedObjectType::Datacenter => "Datacenter",
            ManagedObjectType::ClusterComputeResource => "ClusterComputeResource",
            ManagedObjectType::ComputeResource => "ComputeResource",
            ManagedObjectType::ResourcePool => "ResourcePool",
            ManagedObjectType::VirtualApp => "VirtualApp",
            ManagedObjectType::Network => "Network",
            ManagedObjectType::DistributedVirtualPortgroup => "DistributedVirtualPortgroup",
            ManagedObjectType::VmwareDistributedVirtualSwitch => "VmwareDistributedVirtualSwitch",
            ManagedObjectType::SessionManager => "SessionManager",
            ManagedObjectType::Other(s) => s,
        }
    }
}

impl From<&str> for ManagedObjectType {
    fn from(s: &str) -> Self {
        match s {
            "VirtualMachine" => ManagedObjectType::VirtualMachine,
            "HostSystem" => ManagedObjectType::HostSystem,
            "Datastore" => ManagedObjectType::Datastore,
            "Folder" => ManagedObjectType::Folder,
            "Datacenter" => ManagedObjectType::Datacenter,
            "ClusterComputeResource" => ManagedObjectType::ClusterComputeResource,
            "ComputeResource" => ManagedObjectType::ComputeResource,
            "ResourcePool" => ManagedObjectType::ResourcePool,
            "VirtualApp" => ManagedObjectType::VirtualApp,
            "Network" => ManagedObjectType::Network,
            "DistributedVirtualPortgroup" => ManagedObjectType::DistributedVirtualPortgroup,
            "VmwareDistributedVirtualSwitch" => ManagedObjectType::VmwareDistributedVirtualSwitch,
            "SessionManager" => ManagedObjectType::SessionManager,
            other => ManagedObjectType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ManagedObjectType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which properties of one object type are tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathSpec {
    AllProperties,
    /// Ordered, duplicate free list of property paths
    Paths(Vec<String>),
}

impl PathSpec {
    pub fn paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for p in paths {
            let p = p.into();
            if !out.contains(&p) {
                out.push(p);
            }
        }
        PathSpec::Paths(out)
    }

    /// True when `path`, or one of its dotted prefixes, is already tracked.
    pub fn covers(
        &self,
        path: &str,
    ) -> bool {
        match self {
            PathSpec::AllProperties => true,
            PathSpec::Paths(tracked) => path_prefixes(path)
                .map(|prefixes| prefixes.iter().any(|p| tracked.contains(p)))
                .unwrap_or(false),
        }
    }
}

/// Object type → tracked property paths.
///
/// Built once when a monitor is configured and owned by it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMap {
    entries: BTreeMap<ManagedObjectType, PathSpec>,
}

/// API major version from which `VirtualMachine.runtime.memoryOverhead` is reported.
const MEMORY_OVERHEAD_API_MAJOR: u32 = 4;

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track every property of `ty`.
    pub fn with_all(
        mut self,
        ty: impl Into<ManagedObjectType>,
    ) -> Self {
        self.entries.insert(ty.into(), PathSpec::AllProperties);
        self
    }

    /// Track an explicit path list for `ty`.
    pub fn with_paths<I, S>(
        mut self,
        ty: impl Into<ManagedObjectType>,
        paths: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(ty.into(), PathSpec::paths(paths));
        self
    }

    pub fn insert(
        &mut self,
        ty: impl Into<ManagedObjectType>,
        spec: PathSpec,
    ) -> Option<PathSpec> {
        self.entries.insert(ty.into(), spec)
    }

    pub fn get(
        &self,
        ty: &ManagedObjectType,
    ) -> Option<&PathSpec> {
        self.entries.get(ty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ManagedObjectType, &PathSpec)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds a single extra path to an already tracked type.
    ///
    /// No-op when `ty` is not tracked, when it tracks all properties, or when
    /// `path` or one of its dotted prefixes is already tracked.
    ///
    /// # Returns
    /// `true` if the path was appended
    pub fn add_property(
        &mut self,
        ty: &ManagedObjectType,
        path: &str,
    ) -> bool {
        let Some(spec) = self.entries.get_mut(ty) else {
            return false;
        };
        if spec.covers(path) {
            return false;
        }
        match spec {
            PathSpec::Paths(paths) => {
                debug!(%ty, path, "add_property");
                paths.push(path.to_string());
                true
            }
            PathSpec::AllProperties => false,
        }
    }

    /// Extends the map with paths only reported by newer service versions.
    ///
    /// `api_version` is the dotted service API version, e.g. `"6.7.3"`.
    pub fn extend_for_api(
        &mut self,
        api_version: &str,
    ) {
        let major = api_version
            .split('.')
            .next()
            .and_then(|m| m.trim().parse::<u32>().ok())
            .unwrap_or(0);

        if major >= MEMORY_OVERHEAD_API_MAJOR {
            self.add_property(&ManagedObjectType::VirtualMachine, "runtime.memoryOverhead");
        }
    }

    /// Rejects maps that would produce an unusable filter.
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "property map tracks no object types".to_string(),
            )));
        }

        for (ty, spec) in &self.entries {
            let PathSpec::Paths(paths) = spec else {
                continue;
            };
            if paths.is_empty() {
                return Err(Error::Config(ConfigError::Message(format!(
                    "property map entry {} has an empty path list",
                    ty
                ))));
            }
            for path in paths {
                split_prop_path(path).map_err(|_| {
                    Error::Config(ConfigError::Message(format!(
                        "property map entry {} has malformed path {:?}",
                        ty, path
                    )))
                })?;
            }
        }
        Ok(())
    }
}
