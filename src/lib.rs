//! Change notifications from a virtualization management service's property
//! collector.
//!
//! The crate subscribes to a set of object types and property paths, polls
//! for incremental updates with a server-side bounded wait, and dispatches
//! each changed object to a caller-supplied handler until stopped. It also
//! materializes one-shot flat `(path, value)` property snapshots back into
//! nested trees.
//!
//! Session establishment, request marshaling and credentials are owned by
//! the embedding application and reach the crate through the
//! [`PropertyCollector`] trait.
//!
//! # Modules
//! - [`filter`] - tracked property map and filter request construction
//! - [`snapshot`] - path materialization and one-shot snapshots
//! - [`monitor`] - liveness probe, update decoding and the poll loop
//! - [`config`] - layered [`MonitorConfig`]
//! - [`metrics`] - prometheus counters

mod constants;
mod errors;

pub mod config;
pub mod filter;
pub mod metrics;
pub mod model;
pub mod monitor;
pub mod snapshot;
pub mod transport;

pub use config::*;
pub use errors::*;
pub use filter::*;
pub use model::*;
pub use monitor::*;
pub use snapshot::*;
pub use transport::*;

//-----------------------------------------------------------
// Test utils
