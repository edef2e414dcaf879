//! Server-side filter description: which object types and property paths to
//! track ([`PropertyMap`]) and the request built from it
//! ([`FilterSpecBuilder`]).

mod filter_spec;
mod property_map;

pub use filter_spec::*;
pub use property_map::*;
