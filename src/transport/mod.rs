//! This module is the seam towards the session/connection layer.
//!
//! Connecting, authenticating and marshaling requests belong to the
//! embedding application; the monitor only consumes the property-collector
//! operations below. Every call is async and any call may be issued while a
//! `wait_for_updates` is pending on another task (only
//! `cancel_wait_for_updates` is issued that way by this crate).

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::FilterHandle;
use crate::ObjectContent;
use crate::ObjectRef;
use crate::PropertyFilterSpec;
use crate::TransportError;
use crate::UpdateBatch;
use crate::VersionCursor;

pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait PropertyCollector: Send + Sync + 'static {
    /// Creates a server-side property filter on `collector`.
    ///
    /// # Arguments
    /// * `collector` - property-collector endpoint of the session
    /// * `spec` - object traversal and per-type property paths to watch
    /// * `partial_updates` - report only changed properties of modified objects
    async fn create_filter(
        &self,
        collector: &ObjectRef,
        spec: &PropertyFilterSpec,
        partial_updates: bool,
    ) -> TransportResult<FilterHandle>;

    /// Releases a filter created by [`create_filter`](Self::create_filter).
    async fn destroy_filter(
        &self,
        filter: &FilterHandle,
    ) -> TransportResult<()>;

    /// Blocks until changes newer than `version` exist or `max_wait` elapses
    /// on the service.
    ///
    /// # Returns
    /// - `Ok(None)` when the service timed out without any change
    /// - `Err(TransportError::ReceiveTimeout)` when the transport gave up
    ///   reading the response
    /// - `Err(TransportError::Canceled)` when a concurrent
    ///   [`cancel_wait_for_updates`](Self::cancel_wait_for_updates) unblocked the call
    async fn wait_for_updates(
        &self,
        collector: &ObjectRef,
        version: Option<VersionCursor>,
        max_wait: Duration,
    ) -> TransportResult<Option<UpdateBatch>>;

    /// Unblocks a concurrently pending [`wait_for_updates`](Self::wait_for_updates).
    async fn cancel_wait_for_updates(
        &self,
        collector: &ObjectRef,
    ) -> TransportResult<()>;

    /// One-shot synchronous property query.
    async fn retrieve_properties(
        &self,
        collector: &ObjectRef,
        spec: &PropertyFilterSpec,
    ) -> TransportResult<Vec<ObjectContent>>;

    /// Closes the session.
    async fn disconnect(&self) -> TransportResult<()>;
}
