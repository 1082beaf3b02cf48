pub mod assembly;
pub mod clust;
pub mod dist;
pub mod driver;
pub mod error;
pub mod io;
pub mod matrix;
pub mod stat;

pub use error::DerepError;
