//! Full-object property snapshots.
//!
//! A one-shot `retrieveProperties` answers with a flat list of
//! `(path, value)` pairs; [`PathMaterializer`] folds them back into the
//! nested tree the paths describe and [`SnapshotFetcher`] wires the two
//! together for a single object.

mod fetcher;
mod materializer;
pub(crate) mod path;

pub use fetcher::*;
pub use materializer::*;
