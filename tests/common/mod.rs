use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use prop_monitor::ChangedProperties;
use prop_monitor::DynamicProperty;
use prop_monitor::FilterHandle;
use prop_monitor::FilterUpdate;
use prop_monitor::ObjectContent;
use prop_monitor::ObjectRef;
use prop_monitor::ObjectUpdate;
use prop_monitor::PropValue;
use prop_monitor::PropertyChange;
use prop_monitor::PropertyCollector;
use prop_monitor::PropertyFilterSpec;
use prop_monitor::PropertyMap;
use prop_monitor::ServiceContent;
use prop_monitor::TransportError;
use prop_monitor::TransportResult;
use prop_monitor::UpdateBatch;
use prop_monitor::UpdateKind;
use prop_monitor::UpdateMonitor;
use prop_monitor::VersionCursor;
use tokio::sync::Notify;

pub const FILTER_ID: &str = "session[9f3c]filter-7";

/// Upper bound for anything a test awaits on.
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

/// One scripted answer to `wait_for_updates`.
#[derive(Debug, Clone)]
pub enum Step {
    Batch(UpdateBatch),
    NoChange,
    Timeout,
    Fault(String),
    Interrupted,
    /// Parks the caller until `cancel_wait_for_updates`
    Block,
}

/// In-memory property collector that replays a script of wait results.
///
/// Once the script is exhausted every wait blocks until canceled.
#[derive(Default)]
pub struct ScriptedCollector {
    steps: Mutex<VecDeque<Step>>,
    versions_seen: Mutex<Vec<Option<VersionCursor>>>,
    snapshots: Mutex<HashMap<ObjectRef, Vec<DynamicProperty>>>,
    session_dead: AtomicBool,
    waiting: AtomicBool,
    canceled: Notify,

    pub filters_created: AtomicUsize,
    pub filters_destroyed: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub cancels: AtomicUsize,
}

impl ScriptedCollector {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into_iter().collect()),
            ..Default::default()
        })
    }

    pub fn with_snapshot(
        self: Arc<Self>,
        obj: ObjectRef,
        props: Vec<DynamicProperty>,
    ) -> Arc<Self> {
        self.snapshots.lock().insert(obj, props);
        self
    }

    pub fn kill_session(&self) {
        self.session_dead.store(true, Ordering::SeqCst);
    }

    /// Cursors passed to every `wait_for_updates`, in call order.
    pub fn versions_seen(&self) -> Vec<Option<String>> {
        self.versions_seen
            .lock()
            .iter()
            .map(|v| v.as_ref().map(|v| v.as_str().to_string()))
            .collect()
    }

    /// Resolves once a wait is parked on [`Step::Block`].
    pub async fn until_blocked(&self) {
        while !self.waiting.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// Clears the parked flag however the wait ends, including being dropped.
struct Parked<'a>(&'a AtomicBool);

impl<'a> Parked<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for Parked<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

#[async_trait]
impl PropertyCollector for ScriptedCollector {
    async fn create_filter(
        &self,
        _collector: &ObjectRef,
        _spec: &PropertyFilterSpec,
        _partial_updates: bool,
    ) -> TransportResult<FilterHandle> {
        Self::bump(&self.filters_created);
        Ok(FilterHandle::new(FILTER_ID))
    }

    async fn destroy_filter(
        &self,
        _filter: &FilterHandle,
    ) -> TransportResult<()> {
        Self::bump(&self.filters_destroyed);
        Ok(())
    }

    async fn wait_for_updates(
        &self,
        _collector: &ObjectRef,
        version: Option<VersionCursor>,
        _max_wait: Duration,
    ) -> TransportResult<Option<UpdateBatch>> {
        self.versions_seen.lock().push(version);
        let step = self.steps.lock().pop_front().unwrap_or(Step::Block);

        match step {
            Step::Batch(batch) => Ok(Some(batch)),
            Step::NoChange => Ok(None),
            Step::Timeout => Err(TransportError::ReceiveTimeout),
            Step::Fault(msg) => Err(TransportError::Fault(msg)),
            Step::Interrupted => Err(TransportError::Interrupted("SIGHUP".to_string())),
            Step::Block => {
                let _parked = Parked::enter(&self.waiting);
                self.canceled.notified().await;
                Err(TransportError::Canceled)
            }
        }
    }

    async fn cancel_wait_for_updates(
        &self,
        _collector: &ObjectRef,
    ) -> TransportResult<()> {
        Self::bump(&self.cancels);
        self.canceled.notify_one();
        Ok(())
    }

    async fn retrieve_properties(
        &self,
        _collector: &ObjectRef,
        spec: &PropertyFilterSpec,
    ) -> TransportResult<Vec<ObjectContent>> {
        let Some(target) = spec.object_set.object_set.first().map(|o| o.obj.clone()) else {
            return Ok(Vec::new());
        };

        if target == service_content().session_manager {
            if self.session_dead.load(Ordering::SeqCst) {
                return Err(TransportError::Fault("The session is not authenticated.".to_string()));
            }
            return Ok(vec![ObjectContent {
                obj: target,
                prop_set: vec![DynamicProperty::new("currentSession", "9f3c")],
            }]);
        }

        let props = self.snapshots.lock().get(&target).cloned();
        Ok(props
            .map(|prop_set| vec![ObjectContent { obj: target, prop_set }])
            .unwrap_or_default())
    }

    async fn disconnect(&self) -> TransportResult<()> {
        Self::bump(&self.disconnects);
        Ok(())
    }
}

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

pub fn update(
    obj: ObjectRef,
    kind: &str,
    changes: &[(&str, PropValue)],
) -> ObjectUpdate {
    ObjectUpdate {
        obj,
        kind: UpdateKind::from(kind),
        change_set: changes
            .iter()
            .map(|(path, val)| PropertyChange::assign(*path, val.clone()))
            .collect(),
    }
}

pub fn batch(
    version: &str,
    updates: Vec<ObjectUpdate>,
) -> Step {
    Step::Batch(UpdateBatch {
        version: Some(VersionCursor::from(version)),
        filter_set: vec![FilterUpdate {
            filter: FilterHandle::new(FILTER_ID),
            object_set: updates,
        }],
    })
}

pub fn vm_monitor(collector: Arc<ScriptedCollector>) -> Arc<UpdateMonitor> {
    Arc::new(
        UpdateMonitor::builder(collector, service_content())
            .property_map(PropertyMap::new().with_paths("VirtualMachine", ["name", "runtime.powerState"]))
            .build()
            .expect("valid monitor"),
    )
}

pub type Dispatched = Arc<Mutex<Vec<(ObjectRef, Option<ChangedProperties>)>>>;

pub fn recorder() -> (Dispatched, impl FnMut(ObjectRef, Option<ChangedProperties>) + Send + 'static) {
    let seen: Dispatched = Arc::default();
    let sink = seen.clone();
    (seen, move |obj, props| sink.lock().push((obj, props)))
}
