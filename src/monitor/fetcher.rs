use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::LivenessProbe;
use super::ObjectUpdateDecoder;
use crate::metrics::POLL_REQUESTS;
use crate::metrics::POLL_TIMEOUT_RETRIES;
use crate::metrics::UPDATE_BATCHES;
use crate::ChangedProperties;
use crate::FilterHandle;
use crate::MonitorError;
use crate::MonitorObserver;
use crate::ObjectRef;
use crate::PropertyCollector;
use crate::Result;
use crate::TransportError;
use crate::UpdateBatch;
use crate::VersionCursor;

/// Outcome of one bounded-wait round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The service timed out without changes; poll again with the same cursor
    NoChange,
    Batch(UpdateBatch),
    /// `stop()` canceled the pending wait
    Canceled,
}

/// Outcome of one fetch-and-dispatch step.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    NoChange,
    /// A batch was dispatched; `version` is the cursor to poll with next
    Applied { version: Option<VersionCursor> },
    Canceled,
}

/// Performs `waitForUpdates` round trips for one filter and hands the
/// decoded object updates to the caller's handler.
pub struct IncrementalUpdateFetcher {
    collector: Arc<dyn PropertyCollector>,
    property_collector: ObjectRef,
    liveness: Arc<LivenessProbe>,
    decoder: ObjectUpdateDecoder,
    observer: Arc<dyn MonitorObserver>,
}

impl IncrementalUpdateFetcher {
    pub fn new(
        collector: Arc<dyn PropertyCollector>,
        property_collector: ObjectRef,
        liveness: Arc<LivenessProbe>,
        decoder: ObjectUpdateDecoder,
        observer: Arc<dyn MonitorObserver>,
    ) -> Self {
        Self {
            collector,
            property_collector,
            liveness,
            decoder,
            observer,
        }
    }

    /// Waits for the next batch after `version`.
    ///
    /// Transport receive timeouts are retried for as long as the session is
    /// alive; each attempt is bounded on the service side by `max_wait`.
    /// Cancellation through `cancel` or a `Canceled` transport error both
    /// yield [`FetchOutcome::Canceled`].
    ///
    /// # Errors
    /// - [`MonitorError::ConnectionLost`] when a timeout hits a dead session
    /// - any other transport error, unchanged
    pub async fn fetch(
        &self,
        version: Option<&VersionCursor>,
        max_wait: Duration,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome> {
        loop {
            self.observer.on_poll(version);
            POLL_REQUESTS.inc();
            info!(version = ?version, "call to waitForUpdates...Starting");

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("call to waitForUpdates...Canceled");
                    return Ok(FetchOutcome::Canceled);
                }
                r = self.collector.wait_for_updates(&self.property_collector, version.cloned(), max_wait) => r,
            };

            match result {
                Ok(None) => {
                    info!("call to waitForUpdates...Complete (no change)");
                    return Ok(FetchOutcome::NoChange);
                }
                Ok(Some(batch)) => {
                    info!("call to waitForUpdates...Complete");
                    return Ok(FetchOutcome::Batch(batch));
                }
                Err(TransportError::ReceiveTimeout) => {
                    info!("call to waitForUpdates...Timeout");
                    let alive = self.liveness.is_alive().await;
                    self.observer.on_timeout(alive);
                    if alive {
                        POLL_TIMEOUT_RETRIES.inc();
                        continue;
                    }
                    warn!("connection lost");
                    return Err(MonitorError::ConnectionLost.into());
                }
                Err(TransportError::Canceled) => {
                    info!("waitForUpdates canceled");
                    return Ok(FetchOutcome::Canceled);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Dispatches every object update of `batch` that belongs to `filter`, in
    /// order.
    ///
    /// # Returns
    /// The cursor to poll with next: the batch's own version when it carries
    /// one, otherwise `previous`.
    pub fn apply<F>(
        &self,
        batch: UpdateBatch,
        filter: &FilterHandle,
        previous: Option<&VersionCursor>,
        handler: &mut F,
    ) -> Option<VersionCursor>
    where
        F: FnMut(ObjectRef, Option<ChangedProperties>),
    {
        let version = batch.version.or_else(|| previous.cloned());
        let mut dispatched = 0usize;

        for filter_update in batch.filter_set {
            if &filter_update.filter != filter {
                debug!(filter = %filter_update.filter, "skipping update for foreign filter");
                continue;
            }
            for object_update in filter_update.object_set {
                if let Some((obj, props)) = self.decoder.decode(object_update) {
                    handler(obj, props);
                    dispatched += 1;
                }
            }
        }

        if dispatched > 0 {
            UPDATE_BATCHES.inc();
        }
        self.observer.on_batch(version.as_ref(), dispatched);
        version
    }

    /// One fetch followed by dispatch of whatever it returned.
    pub async fn do_update<F>(
        &self,
        version: Option<&VersionCursor>,
        max_wait: Duration,
        cancel: &CancellationToken,
        filter: &FilterHandle,
        handler: &mut F,
    ) -> Result<PollOutcome>
    where
        F: FnMut(ObjectRef, Option<ChangedProperties>),
    {
        Ok(match self.fetch(version, max_wait, cancel).await? {
            FetchOutcome::NoChange => PollOutcome::NoChange,
            FetchOutcome::Canceled => PollOutcome::Canceled,
            FetchOutcome::Batch(batch) => PollOutcome::Applied {
                version: self.apply(batch, filter, version, handler),
            },
        })
    }
}
