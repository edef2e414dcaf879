//! The update monitor: subscribe, poll and dispatch until stopped, then
//! release the subscription.
//!
//! # Lifecycle
//! 1. `monitor()` creates the server-side filter and starts with an empty
//!    version cursor.
//! 2. Each iteration performs one bounded `waitForUpdates` and dispatches the
//!    decoded object updates to the handler, strictly in order.
//! 3. `stop()` (from any task) clears the keep-running flag, cancels the
//!    run's token and asks the service to cancel the pending wait.
//! 4. On exit the filter is destroyed and the session closed, provided the
//!    session is still alive. Cleanup failures are logged, never returned.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::IncrementalUpdateFetcher;
use super::LivenessProbe;
use super::PollOutcome;
use super::UpdateMonitorBuilder;
use crate::ChangedProperties;
use crate::Error;
use crate::FilterHandle;
use crate::FilterSpecBuilder;
use crate::MonitorConfig;
use crate::MonitorError;
use crate::MonitorObserver;
use crate::ObjectRef;
use crate::ObjectTraversalSpec;
use crate::PropMap;
use crate::PropertyCollector;
use crate::PropertyFilterSpec;
use crate::PropertyMap;
use crate::Result;
use crate::ServiceContent;
use crate::SnapshotFetcher;
use crate::TransportError;
use crate::VersionCursor;

/// Why a `monitor()` call returned without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stop()` was requested
    Stopped,
    /// The transport reported a non-terminating interrupt; it was absorbed
    Interrupted,
}

pub struct UpdateMonitor {
    pub(super) collector: Arc<dyn PropertyCollector>,
    pub(super) service: ServiceContent,
    pub(super) property_map: PropertyMap,
    pub(super) traversal: ObjectTraversalSpec,
    pub(super) config: MonitorConfig,
    pub(super) observer: Arc<dyn MonitorObserver>,
    pub(super) snapshot: SnapshotFetcher,
    pub(super) liveness: Arc<LivenessProbe>,
    pub(super) fetcher: IncrementalUpdateFetcher,

    /// A loop is between entry and final cleanup
    pub(super) active: AtomicBool,
    /// Cleared by `stop()`; checked before every fetch
    pub(super) keep_running: AtomicBool,
    pub(super) filter: Mutex<Option<FilterHandle>>,
    /// Token of the current run; guards the `active`/`keep_running` handshake
    pub(super) cancel: Mutex<Option<CancellationToken>>,
}

impl UpdateMonitor {
    /// Starts configuring a monitor for an already connected session.
    pub fn builder(
        collector: Arc<dyn PropertyCollector>,
        service: ServiceContent,
    ) -> UpdateMonitorBuilder {
        UpdateMonitorBuilder::new(collector, service)
    }

    /// Runs the subscribe / poll / dispatch loop until [`stop`](Self::stop)
    /// is called or a fatal error occurs.
    ///
    /// `handler` receives every object update in order: the object plus its
    /// changed properties, or `None` when the object left the filter's scope.
    ///
    /// # Errors
    /// - [`MonitorError::AlreadyRunning`] if a loop is active on this instance
    /// - [`MonitorError::ConnectionLost`] if the session died during a wait
    /// - [`MonitorError::FilterCreation`] if the filter could not be created
    /// - any other transport error raised inside the loop, after cleanup
    pub async fn monitor<F>(
        &self,
        mut handler: F,
    ) -> Result<StopReason>
    where
        F: FnMut(ObjectRef, Option<ChangedProperties>) + Send,
    {
        let token = self.begin()?;
        debug!(debug_updates = self.config.debug_updates, "monitorUpdates");

        let outcome = match self.run(&token, &mut handler).await {
            Ok(reason) => Ok(reason),
            Err(e) if e.is_canceled() => {
                info!("monitorUpdates: waitForUpdates canceled");
                Ok(StopReason::Stopped)
            }
            Err(e) if e.is_interrupted() => {
                info!("monitorUpdates: {}", e);
                Ok(StopReason::Interrupted)
            }
            Err(e) => {
                error!("monitorUpdates: {:?}", e);
                Err(e)
            }
        };

        self.cleanup().await;
        self.finish();

        if let Ok(reason) = outcome {
            self.observer.on_stopped(reason);
        }
        outcome
    }

    /// Requests a graceful shutdown of the running loop.
    ///
    /// Idempotent: only the first call on a running loop cancels the pending
    /// wait; later calls, or calls while no loop runs, do nothing.
    pub async fn stop(&self) {
        let token = {
            let slot = self.cancel.lock();
            if !self.keep_running.swap(false, Ordering::AcqRel) {
                debug!("stop: monitor is not running");
                return;
            }
            slot.as_ref().cloned()
        };

        info!("stop: stopping...");
        if let Some(token) = token {
            token.cancel();
        }

        info!("stop: calling cancelWaitForUpdates");
        if let Err(e) = self
            .collector
            .cancel_wait_for_updates(&self.service.property_collector)
            .await
        {
            warn!("stop: cancelWaitForUpdates failed: {}", e);
        }
        info!("stop: returned from cancelWaitForUpdates");
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Whether the underlying session is still usable. Once `false`, always `false`.
    pub async fn is_alive(&self) -> bool {
        self.liveness.is_alive().await
    }

    /// Full property snapshot of one object, independent of the loop.
    pub async fn fetch_snapshot(
        &self,
        obj: &ObjectRef,
    ) -> Result<Option<PropMap>> {
        self.snapshot.fetch_snapshot(obj).await
    }

    /// The subscription request this monitor registers.
    pub fn filter_spec(&self) -> PropertyFilterSpec {
        FilterSpecBuilder::build(&self.property_map, &self.traversal)
    }

    pub fn property_map(&self) -> &PropertyMap {
        &self.property_map
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Handle of the filter owned by the running loop, if any.
    pub fn filter_handle(&self) -> Option<FilterHandle> {
        self.filter.lock().clone()
    }

    fn begin(&self) -> Result<CancellationToken> {
        let mut slot = self.cancel.lock();
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(MonitorError::AlreadyRunning.into());
        }
        let token = CancellationToken::new();
        *slot = Some(token.clone());
        self.keep_running.store(true, Ordering::Release);
        Ok(token)
    }

    fn finish(&self) {
        let mut slot = self.cancel.lock();
        self.keep_running.store(false, Ordering::Release);
        *slot = None;
        self.active.store(false, Ordering::Release);
    }

    async fn run<F>(
        &self,
        token: &CancellationToken,
        handler: &mut F,
    ) -> Result<StopReason>
    where
        F: FnMut(ObjectRef, Option<ChangedProperties>) + Send,
    {
        let spec = self.filter_spec();
        let filter = self
            .collector
            .create_filter(&self.service.property_collector, &spec, self.config.partial_updates)
            .await
            .map_err(|e| match e {
                TransportError::Canceled | TransportError::Interrupted(_) => Error::Transport(e),
                source => MonitorError::FilterCreation { source }.into(),
            })?;
        info!(%filter, "monitorUpdates: property filter created");
        *self.filter.lock() = Some(filter.clone());

        let max_wait = self.config.max_wait();
        let mut version: Option<VersionCursor> = None;

        while self.keep_running.load(Ordering::Acquire) {
            match self
                .fetcher
                .do_update(version.as_ref(), max_wait, token, &filter, handler)
                .await?
            {
                PollOutcome::NoChange => continue,
                PollOutcome::Canceled => break,
                PollOutcome::Applied { version: next } => {
                    version = next;
                    if let Some(delay) = self.config.update_delay() {
                        tokio::select! {
                            biased;
                            _ = token.cancelled() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }
        }

        Ok(StopReason::Stopped)
    }

    async fn cleanup(&self) {
        if self.liveness.is_alive().await {
            let filter = self.filter.lock().take();
            if let Some(filter) = filter {
                info!("monitorUpdates: calling destroyPropertyFilter...Starting");
                if let Err(e) = self.collector.destroy_filter(&filter).await {
                    warn!(%filter, "monitorUpdates: destroyPropertyFilter failed: {}", e);
                }
                info!("monitorUpdates: calling destroyPropertyFilter...Complete");
            }
            info!("monitorUpdates: disconnecting...");
            if let Err(e) = self.collector.disconnect().await {
                warn!("monitorUpdates: disconnect failed: {}", e);
            }
            info!("monitorUpdates: disconnected");
        }
        self.filter.lock().take();
    }
}
