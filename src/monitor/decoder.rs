use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use crate::metrics::OBJECT_UPDATES;
use crate::metrics::UNRECOGNIZED_UPDATES;
use crate::ChangedProperties;
use crate::MonitorObserver;
use crate::ObjectRef;
use crate::ObjectUpdate;
use crate::PropertyChange;
use crate::UpdateKind;

/// Result of decoding one object update: the object and its changed
/// properties, or no map when the object left the filter's scope.
pub type DecodedUpdate = (ObjectRef, Option<ChangedProperties>);

/// Classifies and flattens object updates.
pub struct ObjectUpdateDecoder {
    debug_updates: bool,
    observer: Arc<dyn MonitorObserver>,
}

impl ObjectUpdateDecoder {
    pub fn new(
        debug_updates: bool,
        observer: Arc<dyn MonitorObserver>,
    ) -> Self {
        Self {
            debug_updates,
            observer,
        }
    }

    /// # Returns
    /// - `enter` / `modify`: the object and its flattened change set
    /// - `leave`: the object with no properties map
    /// - any other kind: `None`, the update is skipped
    pub fn decode(
        &self,
        update: ObjectUpdate,
    ) -> Option<DecodedUpdate> {
        match update.kind {
            UpdateKind::Enter | UpdateKind::Modify => {
                OBJECT_UPDATES.with_label_values(&[&update.kind.to_string()]).inc();
                let props = self.prop_update(&update.obj, update.change_set);
                Some((update.obj, Some(props)))
            }
            UpdateKind::Leave => {
                OBJECT_UPDATES.with_label_values(&["leave"]).inc();
                Some((update.obj, None))
            }
            UpdateKind::Other(kind) => {
                warn!(obj = %update.obj, "unrecognized operation: {}", kind);
                UNRECOGNIZED_UPDATES.inc();
                self.observer.on_unrecognized_kind(&update.obj, &kind);
                None
            }
        }
    }

    /// Flattens a change set into path → value, last write wins.
    pub fn prop_update(
        &self,
        obj: &ObjectRef,
        change_set: Vec<PropertyChange>,
    ) -> ChangedProperties {
        let mut changed = ChangedProperties::with_capacity(change_set.len());
        for change in change_set {
            if self.debug_updates {
                debug!(
                    %obj,
                    path = %change.name,
                    op = ?change.op,
                    val = ?change.val,
                    "propChange"
                );
            }
            changed.insert(change.name, change.val);
        }
        changed
    }
}
