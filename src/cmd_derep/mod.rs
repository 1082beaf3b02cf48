//! Subcommand modules for the `derep` binary.

pub mod dist;
pub mod n50;
pub mod run;
pub mod scan;
