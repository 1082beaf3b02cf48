//! Dereplication of genome assemblies.
//!
//! Near-duplicate assemblies are grouped by single-linkage clustering on pairwise distances and
//! only the most contiguous one (largest N50) of each group is kept.

#[macro_use]
extern crate log;

pub mod libs;

pub use crate::libs::io::*;
