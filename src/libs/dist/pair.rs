use anyhow::Context;
use std::collections::HashMap;
use std::io::BufRead;

use super::DistanceProvider;
use crate::libs::assembly::file_name;
use crate::libs::matrix::DistMatrix;
use crate::libs::DerepError;

/// Precomputed distances, `name1  name2  distance` per line.
///
/// Names may be full identifiers or bare file names.
#[derive(Debug, Clone, Default)]
pub struct PairTable {
    distance_of: HashMap<(String, String), f64>,
}

fn key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl PairTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path(infile: &str) -> anyhow::Result<Self> {
        let reader = crate::reader(infile)?;
        Self::from_reader(reader).with_context(|| format!("could not load distances from {}", infile))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> anyhow::Result<Self> {
        let mut table = Self::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 {
                anyhow::bail!("line {}: expected 3 tab-separated fields", i + 1);
            }
            let distance: f64 = fields[2]
                .trim()
                .parse()
                .with_context(|| format!("line {}: invalid distance {}", i + 1, fields[2]))?;
            table.insert(fields[0], fields[1], distance);
        }
        Ok(table)
    }

    pub fn insert(&mut self, a: &str, b: &str, distance: f64) {
        self.distance_of.insert(key(a, b), distance);
    }

    pub fn len(&self) -> usize {
        self.distance_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distance_of.is_empty()
    }

    /// Looks up by identifiers first, then by file names
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        if a == b {
            return Some(0.0);
        }
        self.distance_of
            .get(&key(a, b))
            .or_else(|| self.distance_of.get(&key(&file_name(a), &file_name(b))))
            .copied()
    }
}

impl DistanceProvider for PairTable {
    fn matrix(&self, ids: &[String]) -> anyhow::Result<DistMatrix> {
        let mut matrix = DistMatrix::new(ids);
        for (i, a) in ids.iter().enumerate() {
            for (j, b) in ids.iter().enumerate().skip(i + 1) {
                let distance = self
                    .get(a, b)
                    .ok_or_else(|| DerepError::MissingDistance(a.to_string(), b.to_string()))?;
                matrix.set(i, j, distance);
            }
        }
        Ok(matrix)
    }
}
