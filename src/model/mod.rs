//! Wire-independent data model shared by the filter, snapshot and monitor
//! layers.

mod object;
mod update;
mod value;

pub use object::*;
pub use update::*;
pub use value::*;
