//! Single-linkage dereplication.

pub mod batch;
pub mod cc;
pub mod config;
pub mod count;
pub mod union_find;

pub use batch::{BatchScheduler, Outcome};
pub use cc::{cluster, cluster_matrix, single_linkage, Cluster};
pub use config::DerepConfig;
pub use count::reduce_to_count;
pub use union_find::UnionFind;
