//! Incremental update monitoring.
//!
//! Components, leaves first:
//! - [`LivenessProbe`] - is the session still usable
//! - [`ObjectUpdateDecoder`] - classify and flatten one object update
//! - [`IncrementalUpdateFetcher`] - one bounded-wait round trip with timeout retry
//! - [`UpdateMonitor`] - subscribe, poll and dispatch until stopped
//!
//! # Basic Usage
//! ```ignore
//! use std::sync::Arc;
//! use prop_monitor::{PropertyMap, UpdateMonitor};
//!
//! let monitor = Arc::new(
//!     UpdateMonitor::builder(collector, service_content)
//!         .property_map(PropertyMap::new().with_paths("VirtualMachine", ["name", "runtime.powerState"]))
//!         .api_version("7.0")
//!         .build()?,
//! );
//!
//! let stopper = monitor.clone();
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     stopper.stop().await;
//! });
//!
//! monitor
//!     .monitor(|obj, props| match props {
//!         Some(props) => println!("{obj} changed: {props:?}"),
//!         None => println!("{obj} removed"),
//!     })
//!     .await?;
//! ```

mod builder;
mod decoder;
mod fetcher;
mod liveness;
mod observer;
mod updater;

pub use builder::*;
pub use decoder::*;
pub use fetcher::*;
pub use liveness::*;
pub use observer::*;
pub use updater::*;
