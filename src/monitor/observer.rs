use crate::ObjectRef;
use crate::StopReason;
use crate::VersionCursor;

/// Receives structured poll-loop events.
///
/// Every method defaults to a no-op; an observer only sees what happens and
/// can never change the loop's control flow.
pub trait MonitorObserver: Send + Sync {
    /// A `waitForUpdates` round trip is about to be issued
    fn on_poll(
        &self,
        _version: Option<&VersionCursor>,
    ) {
    }

    /// The transport timed out; `alive` is the liveness verdict that decides
    /// between retry and failure
    fn on_timeout(
        &self,
        _alive: bool,
    ) {
    }

    /// A batch was received and dispatched
    fn on_batch(
        &self,
        _version: Option<&VersionCursor>,
        _dispatched: usize,
    ) {
    }

    /// An object update of unknown kind was skipped
    fn on_unrecognized_kind(
        &self,
        _obj: &ObjectRef,
        _kind: &str,
    ) {
    }

    /// The loop ended gracefully
    fn on_stopped(
        &self,
        _reason: StopReason,
    ) {
    }
}

/// Observer used when none is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MonitorObserver for NoopObserver {}
