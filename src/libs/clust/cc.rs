use itertools::Itertools;

use super::union_find::UnionFind;
use crate::libs::dist::DistanceProvider;
use crate::libs::matrix::DistMatrix;
use crate::libs::DerepError;

/// Assemblies linked by chains of distances below the threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// The member with the largest quality
    pub representative: String,
    /// Everyone else, sorted
    pub removed: Vec<String>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        1 + self.removed.len()
    }

    pub fn is_singleton(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Whether `a` should represent a cluster instead of `b`.
///
/// Larger quality wins; equal qualities go to the lexicographically smaller identifier.
pub fn is_better(quality_a: usize, a: &str, quality_b: usize, b: &str) -> bool {
    quality_a > quality_b || (quality_a == quality_b && a < b)
}

/// Connected components of the graph with an edge wherever distance < threshold.
///
/// Returns row indices of `matrix`, see [`UnionFind::components`] for the order.
pub fn single_linkage(matrix: &DistMatrix, threshold: f64) -> Result<Vec<Vec<usize>>, DerepError> {
    let n = matrix.size();
    let mut uf = UnionFind::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let distance = matrix.get(i, j);
            if distance.is_nan() {
                return Err(DerepError::MissingDistance(
                    matrix.name(i).to_string(),
                    matrix.name(j).to_string(),
                ));
            }
            if distance < threshold {
                uf.unite(i, j);
            }
        }
    }
    Ok(uf.components())
}

/// Clusters everything in `matrix` and picks one representative per cluster.
pub fn cluster_matrix<F>(
    matrix: &DistMatrix,
    quality: F,
    threshold: f64,
) -> Result<Vec<Cluster>, DerepError>
where
    F: Fn(&str) -> usize,
{
    let components = single_linkage(matrix, threshold)?;

    let clusters = components
        .into_iter()
        .map(|component| {
            let names: Vec<&str> = component.iter().map(|&i| matrix.name(i)).collect();
            let mut best = names[0];
            let mut best_quality = quality(best);
            for &name in &names[1..] {
                let q = quality(name);
                if is_better(q, name, best_quality, best) {
                    best = name;
                    best_quality = q;
                }
            }
            let removed = names
                .iter()
                .filter(|&&name| name != best)
                .map(|name| name.to_string())
                .sorted()
                .collect();
            Cluster {
                representative: best.to_string(),
                removed,
            }
        })
        .collect();

    Ok(clusters)
}

/// Fetches distances among `ids` and clusters them.
///
/// `ids` are sorted first, so the result does not depend on their order.
/// Fewer than two ids never reach the provider.
pub fn cluster<D, F>(
    ids: &[String],
    provider: &D,
    quality: F,
    threshold: f64,
) -> anyhow::Result<Vec<Cluster>>
where
    D: DistanceProvider + ?Sized,
    F: Fn(&str) -> usize,
{
    let ids: Vec<String> = ids.iter().cloned().sorted().collect();
    if ids.len() < 2 {
        return Ok(ids
            .into_iter()
            .map(|id| Cluster {
                representative: id,
                removed: vec![],
            })
            .collect());
    }

    let matrix = provider.matrix(&ids)?;
    Ok(cluster_matrix(&matrix, quality, threshold)?)
}
