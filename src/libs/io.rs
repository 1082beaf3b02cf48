use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::libs::DerepError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Plain,
    Gzip,
    Bzip2,
    Zip,
}

/// Guess the compression of a file from its first bytes.
///
/// The file extension is not consulted, so a gzipped `.fasta` is still read correctly.
pub fn compression_type<P: AsRef<Path>>(path: P) -> anyhow::Result<Compression> {
    let path = path.as_ref();

    let mut buffer = [0; 4];
    let mut len = 0;
    {
        let mut file =
            File::open(path).with_context(|| format!("could not open {}", path.display()))?;
        // short files are fine, an empty one is plain text
        while len < buffer.len() {
            let n = file.read(&mut buffer[len..])?;
            if n == 0 {
                break;
            }
            len += n;
        }
    }
    let start = &buffer[..len];

    let compression = if start.starts_with(&[0x1f, 0x8b, 0x08]) {
        Compression::Gzip
    } else if start.starts_with(&[0x42, 0x5a, 0x68]) {
        Compression::Bzip2
    } else if start.starts_with(&[0x50, 0x4b, 0x03, 0x04]) {
        Compression::Zip
    } else {
        Compression::Plain
    };

    Ok(compression)
}

/// Open a plain or gzipped file for buffered reading.
///
/// bzip2 and zip archives are rejected.
///
/// ```
/// use std::io::BufRead;
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("a.fa");
/// std::fs::write(&path, ">a\nACGT\n>b\nAC\n").unwrap();
///
/// let reader = derep::reader(path.to_str().unwrap()).unwrap();
/// assert_eq!(reader.lines().count(), 4);
/// ```
pub fn reader(input: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = Path::new(input);
        let compression = compression_type(path)?;
        let file = File::open(path).with_context(|| format!("could not open {}", input))?;

        match compression {
            Compression::Gzip => Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file))),
            Compression::Plain => Box::new(BufReader::new(file)),
            Compression::Bzip2 => {
                return Err(DerepError::Format {
                    path: input.to_string(),
                    message: "cannot use bzip2 format - use gzip instead".to_string(),
                }
                .into())
            }
            Compression::Zip => {
                return Err(DerepError::Format {
                    path: input.to_string(),
                    message: "cannot use zip format - use gzip instead".to_string(),
                }
                .into())
            }
        }
    };

    Ok(reader)
}

pub fn writer(output: &str) -> anyhow::Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if output == "stdout" {
        Box::new(BufWriter::new(std::io::stdout()))
    } else {
        let file =
            File::create(output).with_context(|| format!("could not create {}", output))?;
        Box::new(BufWriter::new(file))
    };

    Ok(writer)
}
