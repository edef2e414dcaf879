//! Property Monitor Error Hierarchy
//!
//! Defines the error types raised while subscribing to, polling and
//! materializing property-collector data, categorized by the layer that
//! produced them.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failures reported by the underlying session/transport collaborator
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Poll loop lifecycle failures
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    /// Snapshot reconstruction failures
    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    /// Monitor configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors surfaced by a [`PropertyCollector`](crate::PropertyCollector)
/// implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No response was read before the transport-level receive timeout
    #[error("Receive timeout while waiting for the service")]
    ReceiveTimeout,

    /// A pending `waitForUpdates` was canceled through `cancelWaitForUpdates`
    #[error("The task was canceled by a user.")]
    Canceled,

    /// The call was interrupted by a process signal other than a terminate request
    #[error("Call interrupted by signal: {0}")]
    Interrupted(String),

    /// The referenced managed object no longer exists on the service
    #[error("Managed object not found: {0}")]
    ObjectNotFound(String),

    /// Any other fault reported by the service or the wire layer
    #[error("Service fault: {0}")]
    Fault(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Liveness probe confirmed the session is gone after a receive timeout
    #[error("Connection lost: session is no longer alive")]
    ConnectionLost,

    /// `monitor` was entered while another loop is still running on this instance
    #[error("Monitor loop is already running")]
    AlreadyRunning,

    /// The service refused to create the property filter
    #[error("Failed to create property filter: {source}")]
    FilterCreation {
        #[source]
        source: TransportError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaterializeError {
    /// An indexed segment names an array element that is not present in the
    /// data received so far
    #[error("Could not traverse tree through array element {key}[{tag}] in {path}")]
    UnresolvedArrayElement { key: String, tag: String, path: String },

    /// An intermediate segment resolves to a value that is neither a map nor an array element
    #[error("Could not traverse tree through scalar value {key} in {path}")]
    NotTraversable { key: String, path: String },

    /// The property path itself cannot be parsed
    #[error("Malformed property path: {0}")]
    MalformedPath(String),
}

impl Error {
    /// True when the error represents a cooperative cancellation requested by
    /// `stop()` rather than a failure.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Transport(TransportError::Canceled))
    }

    /// True when the error represents an absorbed interrupt.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Transport(TransportError::Interrupted(_)))
    }
}
