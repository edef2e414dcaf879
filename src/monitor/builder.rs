use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use config::ConfigError;
use parking_lot::Mutex;

use super::IncrementalUpdateFetcher;
use super::LivenessProbe;
use super::NoopObserver;
use super::ObjectUpdateDecoder;
use super::UpdateMonitor;
use crate::Error;
use crate::MonitorConfig;
use crate::MonitorObserver;
use crate::ObjectTraversalSpec;
use crate::PropertyCollector;
use crate::PropertyMap;
use crate::Result;
use crate::ServiceContent;
use crate::SnapshotFetcher;

pub struct UpdateMonitorBuilder {
    collector: Arc<dyn PropertyCollector>,
    service: ServiceContent,
    property_map: PropertyMap,
    traversal: Option<ObjectTraversalSpec>,
    config: MonitorConfig,
    max_wait: Option<Duration>,
    observer: Arc<dyn MonitorObserver>,
    api_version: Option<String>,
}

impl UpdateMonitorBuilder {
    /// Create a new builder with default config for a connected session
    pub fn new(
        collector: Arc<dyn PropertyCollector>,
        service: ServiceContent,
    ) -> Self {
        Self {
            collector,
            service,
            property_map: PropertyMap::default(),
            traversal: None,
            config: MonitorConfig::default(),
            max_wait: None,
            observer: Arc::new(NoopObserver),
            api_version: None,
        }
    }

    /// Object types and property paths to track
    pub fn property_map(
        mut self,
        property_map: PropertyMap,
    ) -> Self {
        self.property_map = property_map;
        self
    }

    /// Objects to watch (default: the root folder only)
    pub fn traversal(
        mut self,
        traversal: ObjectTraversalSpec,
    ) -> Self {
        self.traversal = Some(traversal);
        self
    }

    /// Service API version, used to extend the property map with paths
    /// only newer services report
    pub fn api_version(
        mut self,
        api_version: impl Into<String>,
    ) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Server-side bound of each wait (default: 60s). The service counts
    /// in whole seconds, so [`build`](Self::build) rejects fractions.
    pub fn max_wait(
        mut self,
        max_wait: Duration,
    ) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Pause after each applied batch (default: none)
    pub fn update_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.config.update_delay_in_ms = delay.as_millis() as u64;
        self
    }

    /// Log every property change at debug level (default: disabled)
    pub fn debug_updates(
        mut self,
        enable: bool,
    ) -> Self {
        self.config.debug_updates = enable;
        self
    }

    /// Completely replaces the configuration, discarding previous calls to
    /// [`max_wait`](Self::max_wait), [`update_delay`](Self::update_delay) and
    /// [`debug_updates`](Self::debug_updates)
    pub fn set_config(
        mut self,
        config: MonitorConfig,
    ) -> Self {
        self.config = config;
        self.max_wait = None;
        self
    }

    pub fn observer(
        mut self,
        observer: Arc<dyn MonitorObserver>,
    ) -> Self {
        self.observer = observer;
        self
    }

    /// Validates configuration and property map and assembles the monitor
    pub fn build(mut self) -> Result<UpdateMonitor> {
        if let Some(max_wait) = self.max_wait {
            if max_wait.is_zero() || max_wait.subsec_nanos() != 0 {
                return Err(Error::Config(ConfigError::Message(format!(
                    "max_wait must be a whole number of seconds greater than 0, got {max_wait:?}"
                ))));
            }
            self.config.max_wait_in_secs = max_wait.as_secs();
        }
        let config = self.config.validate()?;

        let mut property_map = self.property_map;
        if let Some(api_version) = &self.api_version {
            property_map.extend_for_api(api_version);
        }
        property_map.validate()?;

        let traversal = self
            .traversal
            .unwrap_or_else(|| ObjectTraversalSpec::single(self.service.root_folder.clone()));

        let snapshot = SnapshotFetcher::new(self.collector.clone(), self.service.property_collector.clone());
        let liveness = Arc::new(LivenessProbe::new(
            snapshot.clone(),
            self.service.session_manager.clone(),
        ));
        let fetcher = IncrementalUpdateFetcher::new(
            self.collector.clone(),
            self.service.property_collector.clone(),
            liveness.clone(),
            ObjectUpdateDecoder::new(config.debug_updates, self.observer.clone()),
            self.observer.clone(),
        );

        Ok(UpdateMonitor {
            collector: self.collector,
            service: self.service,
            property_map,
            traversal,
            config,
            observer: self.observer,
            snapshot,
            liveness,
            fetcher,
            active: AtomicBool::new(false),
            keep_running: AtomicBool::new(false),
            filter: Mutex::new(None),
            cancel: Mutex::new(None),
        })
    }
}
