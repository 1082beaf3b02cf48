use anyhow::Context;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use super::DistanceProvider;
use crate::libs::matrix::DistMatrix;
use crate::libs::DerepError;

/// Distances from `mash sketch` + `mash dist`
#[derive(Debug, Clone)]
pub struct Mash {
    exe: PathBuf,
    pub threads: usize,
    pub sketch_size: usize,
}

impl Mash {
    /// Rejects settings mash can't run with, without looking for mash
    pub fn check_settings(threads: usize, sketch_size: usize) -> Result<(), DerepError> {
        if threads == 0 {
            return Err(DerepError::Config("--threads must be positive".to_string()));
        }
        if sketch_size == 0 {
            return Err(DerepError::Config("--sketch-size must be positive".to_string()));
        }
        Ok(())
    }

    /// Locates `mash` in PATH
    pub fn new(threads: usize, sketch_size: usize) -> anyhow::Result<Self> {
        Self::check_settings(threads, sketch_size)?;
        let exe = which::which("mash").map_err(|_| DerepError::Tool {
            name: "mash".to_string(),
            message: "not found in PATH. Please install mash first.".to_string(),
        })?;

        Ok(Self {
            exe,
            threads,
            sketch_size,
        })
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<Vec<u8>> {
        trace!("mash {}", args.join(" "));
        let output = Command::new(&self.exe)
            .args(args)
            .output()
            .with_context(|| format!("could not execute {}", self.exe.display()))?;

        if !output.status.success() {
            return Err(DerepError::Tool {
                name: format!("mash {}", args[0]),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(output.stdout)
    }
}

impl DistanceProvider for Mash {
    fn matrix(&self, ids: &[String]) -> anyhow::Result<DistMatrix> {
        let mut matrix = DistMatrix::new(ids);
        if ids.len() < 2 {
            return Ok(matrix);
        }

        // the sketch and the file list live only as long as this call
        let tempdir = tempfile::tempdir()?;
        let list = tempdir.path().join("assemblies.lst");
        {
            let mut writer = std::io::BufWriter::new(std::fs::File::create(&list)?);
            for id in ids {
                writeln!(writer, "{}", id)?;
            }
        }
        let prefix = tempdir.path().join("mash");
        let sketch = tempdir.path().join("mash.msh");

        let threads = self.threads.to_string();
        let sketch_size = self.sketch_size.to_string();
        let prefix = prefix.to_string_lossy().to_string();
        let list = list.to_string_lossy().to_string();
        let sketch = sketch.to_string_lossy().to_string();

        self.run(&[
            "sketch",
            "-p",
            &threads,
            "-s",
            &sketch_size,
            "-o",
            &prefix,
            "-l",
            &list,
        ])?;
        let stdout = self.run(&["dist", "-p", &threads, &sketch, &sketch])?;

        let text = String::from_utf8(stdout).context("mash dist output is not UTF-8")?;
        parse_mash_dist(&text, &mut matrix)?;
        matrix.check_complete()?;

        Ok(matrix)
    }
}

/// Fills `matrix` from `mash dist` output.
///
/// Each line is `reference  query  distance  p-value  shared-hashes`; names outside the matrix
/// are skipped.
pub fn parse_mash_dist(text: &str, matrix: &mut DistMatrix) -> anyhow::Result<()> {
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(DerepError::Tool {
                name: "mash dist".to_string(),
                message: format!("unexpected output line: {}", line),
            }
            .into());
        }
        let distance: f64 = fields[2].parse().map_err(|_| DerepError::Tool {
            name: "mash dist".to_string(),
            message: format!("invalid distance in line: {}", line),
        })?;

        if fields[0] != fields[1] {
            matrix.set_by_name(fields[0], fields[1], distance);
        }
    }

    Ok(())
}
