//! Token counting and budget analysis

mod budget;
mod counter;
mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use budget::*;
pub use counter::*;
pub use registry::*;
