use indexmap::IndexMap;

use crate::libs::DerepError;

/// A symmetric distance matrix with named rows.
///
/// Only the strict upper triangle is stored; the diagonal is always 0.
/// Unset cells hold NaN until filled.
#[derive(Debug, Clone)]
pub struct DistMatrix {
    index_of: IndexMap<String, usize>,
    values: Vec<f64>,
}

impl DistMatrix {
    pub fn new(names: &[String]) -> Self {
        let mut index_of = IndexMap::new();
        for name in names {
            let next = index_of.len();
            index_of.entry(name.to_string()).or_insert(next);
        }
        let n = index_of.len();
        let values = vec![f64::NAN; n * n.saturating_sub(1) / 2];

        Self { index_of, values }
    }

    pub fn size(&self) -> usize {
        self.index_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_of.is_empty()
    }

    pub fn names(&self) -> Vec<&String> {
        self.index_of.keys().collect()
    }

    pub fn name(&self, i: usize) -> &str {
        self.index_of.get_index(i).map(|(k, _)| k.as_str()).unwrap_or("")
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        self.index_of.get(name).copied()
    }

    // position of (i, j), i < j, in the condensed vector
    fn offset(&self, i: usize, j: usize) -> usize {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        let n = self.size();
        i * n - i * (i + 1) / 2 + (j - i - 1)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i == j {
            0.0
        } else {
            self.values[self.offset(i, j)]
        }
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        if i != j {
            let offset = self.offset(i, j);
            self.values[offset] = value;
        }
    }

    pub fn get_by_name(&self, a: &str, b: &str) -> Option<f64> {
        let (i, j) = (self.index(a)?, self.index(b)?);
        Some(self.get(i, j))
    }

    /// Sets a cell by names, ignoring names not in the matrix.
    /// Returns whether the cell exists.
    pub fn set_by_name(&mut self, a: &str, b: &str, value: f64) -> bool {
        match (self.index(a), self.index(b)) {
            (Some(i), Some(j)) => {
                self.set(i, j, value);
                true
            }
            _ => false,
        }
    }

    /// Fails on the first pair that was never filled
    pub fn check_complete(&self) -> Result<(), DerepError> {
        let n = self.size();
        for i in 0..n {
            for j in (i + 1)..n {
                if self.get(i, j).is_nan() {
                    return Err(DerepError::MissingDistance(
                        self.name(i).to_string(),
                        self.name(j).to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_matrix_basic() {
        let mut m = DistMatrix::new(&names(&["a", "b", "c", "d"]));
        assert_eq!(m.size(), 4);
        assert!(m.get(0, 1).is_nan());
        assert_eq!(m.get(2, 2), 0.0);

        m.set(0, 1, 0.1);
        m.set(3, 2, 0.5);
        assert_eq!(m.get(1, 0), 0.1);
        assert_eq!(m.get(2, 3), 0.5);
        assert_eq!(m.get_by_name("d", "c"), Some(0.5));
        assert_eq!(m.get_by_name("a", "x"), None);
        assert_eq!(m.name(3), "d");
        assert_eq!(m.index("c"), Some(2));
    }

    #[test]
    fn test_matrix_offsets_distinct() {
        let n = 7;
        let list: Vec<String> = (0..n).map(|i| format!("s{}", i)).collect();
        let mut m = DistMatrix::new(&list);
        for i in 0..n {
            for j in (i + 1)..n {
                m.set(i, j, (i * 10 + j) as f64);
            }
        }
        for i in 0..n {
            for j in (i + 1)..n {
                assert_eq!(m.get(j, i), (i * 10 + j) as f64);
            }
        }
        assert!(m.check_complete().is_ok());
    }

    #[test]
    fn test_matrix_incomplete() {
        let mut m = DistMatrix::new(&names(&["a", "b", "c"]));
        assert!(m.set_by_name("a", "b", 0.1));
        assert!(m.set_by_name("c", "a", 0.2));
        assert!(!m.set_by_name("c", "z", 0.2));
        assert_eq!(
            m.check_complete(),
            Err(DerepError::MissingDistance("b".to_string(), "c".to_string()))
        );
    }

    #[test]
    fn test_matrix_tiny() {
        let m = DistMatrix::new(&[]);
        assert!(m.is_empty());
        assert!(m.check_complete().is_ok());

        let m = DistMatrix::new(&names(&["a"]));
        assert_eq!(m.size(), 1);
        assert_eq!(m.get(0, 0), 0.0);
        assert!(m.check_complete().is_ok());
    }
}
