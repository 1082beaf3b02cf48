//! Sources of pairwise distances between assemblies.
//!
//! The dereplication core only sees [`DistanceProvider`]; how the numbers are produced is up to
//! the implementation.

mod mash;
mod pair;

pub use mash::{parse_mash_dist, Mash};
pub use pair::PairTable;

use crate::libs::matrix::DistMatrix;

pub trait DistanceProvider {
    /// The complete matrix for `ids`, in that order.
    ///
    /// Implementations must fail rather than return a matrix with missing cells.
    fn matrix(&self, ids: &[String]) -> anyhow::Result<DistMatrix>;
}

impl<T: DistanceProvider + ?Sized> DistanceProvider for &T {
    fn matrix(&self, ids: &[String]) -> anyhow::Result<DistMatrix> {
        (**self).matrix(ids)
    }
}

impl DistanceProvider for DistMatrix {
    fn matrix(&self, ids: &[String]) -> anyhow::Result<DistMatrix> {
        let mut sub = DistMatrix::new(ids);
        for (i, a) in ids.iter().enumerate() {
            for (j, b) in ids.iter().enumerate().skip(i + 1) {
                match self.get_by_name(a, b) {
                    Some(d) if !d.is_nan() => sub.set(i, j, d),
                    _ => {
                        return Err(crate::libs::DerepError::MissingDistance(
                            a.to_string(),
                            b.to_string(),
                        )
                        .into())
                    }
                }
            }
        }
        Ok(sub)
    }
}
