use super::cc::is_better;
use crate::libs::matrix::DistMatrix;
use crate::libs::DerepError;

/// Drops assemblies from `matrix` until at most `count` remain.
///
/// Pairs are visited from the closest to the farthest (ties by names). Whenever both members of a
/// pair are still present, the worse one goes. The best assembly overall is never dropped.
///
/// Returns `(removed, kept)` pairs in removal order.
pub fn reduce_to_count<F>(
    matrix: &DistMatrix,
    quality: F,
    count: usize,
) -> Result<Vec<(String, String)>, DerepError>
where
    F: Fn(&str) -> usize,
{
    let n = matrix.size();
    let mut removals = vec![];
    if n <= count {
        return Ok(removals);
    }

    let mut pairs: Vec<(f64, usize, usize)> = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let distance = matrix.get(i, j);
            if distance.is_nan() {
                return Err(DerepError::MissingDistance(
                    matrix.name(i).to_string(),
                    matrix.name(j).to_string(),
                ));
            }
            pairs.push((distance, i, j));
        }
    }
    pairs.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then_with(|| matrix.name(a.1).cmp(matrix.name(b.1)))
            .then_with(|| matrix.name(a.2).cmp(matrix.name(b.2)))
    });

    let quality_of: Vec<usize> = (0..n).map(|i| quality(matrix.name(i))).collect();
    let mut alive = vec![true; n];
    let mut remaining = n;
    for (distance, i, j) in pairs {
        if remaining <= count {
            break;
        }
        if !(alive[i] && alive[j]) {
            continue;
        }
        let (keep, drop) = if is_better(quality_of[i], matrix.name(i), quality_of[j], matrix.name(j))
        {
            (i, j)
        } else {
            (j, i)
        };
        alive[drop] = false;
        remaining -= 1;
        debug!(
            "{} removed for {} (distance = {})",
            matrix.name(drop),
            matrix.name(keep),
            distance
        );
        removals.push((matrix.name(drop).to_string(), matrix.name(keep).to_string()));
    }

    Ok(removals)
}
