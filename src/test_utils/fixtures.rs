use std::sync::Arc;

use parking_lot::Mutex;

use crate::constants::CURRENT_SESSION_PATH;
use crate::transport::MockPropertyCollector;
use crate::ChangedProperties;
use crate::DynamicProperty;
use crate::FilterHandle;
use crate::FilterUpdate;
use crate::MonitorObserver;
use crate::ObjectContent;
use crate::ObjectRef;
use crate::ObjectUpdate;
use crate::PropValue;
use crate::PropertyChange;
use crate::PropertyFilterSpec;
use crate::ServiceContent;
use crate::TransportError;
use crate::UpdateBatch;
use crate::UpdateKind;
use crate::VersionCursor;

pub const FILTER_ID: &str = "session[52a1]filter-1";

pub fn service_content() -> ServiceContent {
    ServiceContent {
        property_collector: ObjectRef::new("PropertyCollector", "propertyCollector"),
        root_folder: ObjectRef::new("Folder", "group-d1"),
        session_manager: ObjectRef::new("SessionManager", "SessionManager"),
    }
}

pub fn vm(id: &str) -> ObjectRef {
    ObjectRef::new("VirtualMachine", id)
}

pub fn filter_handle() -> FilterHandle {
    FilterHandle::new(FILTER_ID)
}

/// True when `spec` is the single-object liveness query against the session manager.
pub fn is_session_query(spec: &PropertyFilterSpec) -> bool {
    spec.object_set.object_set.first().map(|o| &o.obj) == Some(&service_content().session_manager)
}

/// Programs `mock` to answer every liveness probe.
pub fn expect_session(
    mock: &mut MockPropertyCollector,
    alive: bool,
) {
    mock.expect_retrieve_properties()
        .withf(|_, spec| is_session_query(spec))
        .returning(move |_, _| {
            if alive {
                Ok(vec![ObjectContent {
                    obj: service_content().session_manager,
                    prop_set: vec![DynamicProperty::new(
                        CURRENT_SESSION_PATH,
                        [("key", PropValue::from("52a1")), ("userName", "admin".into())]
                            .into_iter()
                            .collect::<PropValue>(),
                    )],
                }])
            } else {
                Err(TransportError::Fault("The session is not authenticated.".to_string()))
            }
        });
}

pub fn object_update(
    obj: ObjectRef,
    kind: UpdateKind,
    changes: &[(&str, &str)],
) -> ObjectUpdate {
    ObjectUpdate {
        obj,
        kind,
        change_set: changes
            .iter()
            .map(|(path, val)| PropertyChange::assign(*path, *val))
            .collect(),
    }
}

pub fn batch(
    version: &str,
    filter: &FilterHandle,
    updates: Vec<ObjectUpdate>,
) -> UpdateBatch {
    UpdateBatch {
        version: Some(VersionCursor::from(version)),
        filter_set: vec![FilterUpdate {
            filter: filter.clone(),
            object_set: updates,
        }],
    }
}

pub type Dispatched = Vec<(ObjectRef, Option<ChangedProperties>)>;

/// Handler that records every dispatch in order.
pub fn recording_handler() -> (Arc<Mutex<Dispatched>>, impl FnMut(ObjectRef, Option<ChangedProperties>) + Send) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |obj, props| sink.lock().push((obj, props)))
}

/// Observer that records event names.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<String>>,
}

impl MonitorObserver for RecordingObserver {
    fn on_poll(
        &self,
        version: Option<&VersionCursor>,
    ) {
        self.events
            .lock()
            .push(format!("poll:{}", version.map(|v| v.as_str()).unwrap_or("-")));
    }

    fn on_timeout(
        &self,
        alive: bool,
    ) {
        self.events.lock().push(format!("timeout:{alive}"));
    }

    fn on_unrecognized_kind(
        &self,
        obj: &ObjectRef,
        kind: &str,
    ) {
        self.events.lock().push(format!("unrecognized:{obj}:{kind}"));
    }
}
