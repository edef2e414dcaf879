use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use super::PathMaterializer;
use crate::FilterSpecBuilder;
use crate::ObjectRef;
use crate::PropMap;
use crate::PropertyCollector;
use crate::Result;

/// One-shot property queries against a single managed object.
#[derive(Clone)]
pub struct SnapshotFetcher {
    collector: Arc<dyn PropertyCollector>,
    property_collector: ObjectRef,
}

impl SnapshotFetcher {
    pub fn new(
        collector: Arc<dyn PropertyCollector>,
        property_collector: ObjectRef,
    ) -> Self {
        Self {
            collector,
            property_collector,
        }
    }

    /// Full property state of `obj`, materialized into a nested tree.
    ///
    /// # Returns
    /// - `Ok(None)` when the object is unknown or exposes no properties
    /// - `Err` when the retrieve call fails or the returned paths cannot be
    ///   materialized consistently
    pub async fn fetch_snapshot(
        &self,
        obj: &ObjectRef,
    ) -> Result<Option<PropMap>> {
        self.get_property(obj, None).await
    }

    /// Like [`fetch_snapshot`](Self::fetch_snapshot) but restricted to one
    /// property path when `path` is given.
    pub async fn get_property(
        &self,
        obj: &ObjectRef,
        path: Option<&str>,
    ) -> Result<Option<PropMap>> {
        let spec = FilterSpecBuilder::for_object(obj, path);
        let contents = self
            .collector
            .retrieve_properties(&self.property_collector, &spec)
            .await?;

        let Some(content) = contents.into_iter().next() else {
            debug!(%obj, "retrieve_properties returned no object content");
            return Ok(None);
        };
        if content.prop_set.is_empty() {
            debug!(%obj, "retrieve_properties returned no property list");
            return Ok(None);
        }

        let mut materializer = PathMaterializer::new();
        for prop in content.prop_set {
            if let Err(e) = materializer.insert(&prop.name, prop.val) {
                warn!(%obj, path = %prop.name, "snapshot materialization failed: {}", e);
                return Err(e);
            }
        }
        Ok(Some(materializer.into_tree()))
    }
}
