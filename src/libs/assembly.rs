use anyhow::Context;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::libs::DerepError;

/// File name endings recognized as assemblies
pub const EXTENSIONS: [&str; 6] = [".fasta", ".fasta.gz", ".fna", ".fna.gz", ".fa", ".fa.gz"];

/// An assembly file and its N50, read once when loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    /// Path as discovered, used as the identifier everywhere
    pub id: String,
    pub n50: usize,
}

impl Assembly {
    pub fn new(id: &str, n50: usize) -> Self {
        Self {
            id: id.to_string(),
            n50,
        }
    }

    /// Reads the file and computes its N50
    pub fn load(id: &str) -> anyhow::Result<Self> {
        let n50 = crate::libs::stat::file_n50(id)?;
        Ok(Self::new(id, n50))
    }

    pub fn file_name(&self) -> String {
        file_name(&self.id)
    }
}

/// The last component of a path, or the whole string when there is none
pub fn file_name(id: &str) -> String {
    Path::new(id)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| id.to_string())
}

pub fn is_assembly_file(path: &Path) -> bool {
    match path.file_name() {
        Some(name) => {
            let name = name.to_string_lossy();
            EXTENSIONS.iter().any(|ext| name.ends_with(ext))
        }
        None => false,
    }
}

/// Recursively finds assembly files under `dir`, sorted by path.
pub fn find_assemblies<P: AsRef<Path>>(dir: P) -> anyhow::Result<Vec<String>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(DerepError::Config(format!("{} is not a directory", dir.display())).into());
    }

    let mut paths: Vec<PathBuf> = vec![];
    visit_dir(dir, &mut paths)?;
    paths.sort();

    let ids: Vec<String> = paths
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect();

    // survivors are copied into one flat directory
    let mut seen: HashMap<String, &String> = HashMap::new();
    for id in &ids {
        if let Some(prev) = seen.insert(file_name(id), id) {
            return Err(DerepError::Config(format!(
                "{} and {} have the same file name",
                prev, id
            ))
            .into());
        }
    }

    Ok(ids)
}

fn visit_dir(dir: &Path, paths: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("could not read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            visit_dir(&path, paths)?;
        } else if path.is_file() && is_assembly_file(&path) {
            paths.push(path);
        }
    }
    Ok(())
}

/// Loads all assemblies in parallel, keeping the input order.
///
/// Any unreadable file fails the whole load.
pub fn load_assemblies(ids: &[String]) -> anyhow::Result<Vec<Assembly>> {
    let assemblies = ids
        .par_iter()
        .map(|id| {
            let assembly = Assembly::load(id)?;
            trace!("{}\tN50 = {}", id, assembly.n50);
            Ok(assembly)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(assemblies)
}
