use anyhow::Context;
use std::io::BufRead;

/// Lengths of all records in a FASTA file, plain or gzipped.
///
/// Blank lines anywhere in the file are ignored.
pub fn contig_lengths(infile: &str) -> anyhow::Result<Vec<usize>> {
    let mut reader = crate::reader(infile)?;
    skip_blank_lines(&mut reader)?;
    let mut fa_in = noodles_fasta::io::Reader::new(reader);

    let mut lengths = vec![];
    for result in fa_in.records() {
        let record = result.with_context(|| format!("{}: invalid FASTA record", infile))?;
        lengths.push(record.sequence().len());
    }

    Ok(lengths)
}

// Consumes empty lines before the first definition line
fn skip_blank_lines<R: BufRead + ?Sized>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let buf = reader.fill_buf()?;
        let blank = buf
            .iter()
            .take_while(|&&b| b == b'\n' || b == b'\r' || b == b' ' || b == b'\t')
            .count();
        if blank == 0 {
            return Ok(());
        }
        reader.consume(blank);
    }
}

/// The largest length L such that contigs of length >= L cover at least half of the total.
///
/// ```
/// assert_eq!(derep::libs::stat::n50(&[10, 20, 30]), 20);
/// assert_eq!(derep::libs::stat::n50(&[100, 10, 10, 10]), 100);
/// assert_eq!(derep::libs::stat::n50(&[]), 0);
/// ```
pub fn n50(lengths: &[usize]) -> usize {
    let mut sorted = lengths.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let total: usize = sorted.iter().sum();
    let mut so_far = 0;
    for len in sorted {
        so_far += len;
        // so_far >= total * 0.5
        if so_far * 2 >= total {
            return len;
        }
    }

    0
}

/// N50 of a FASTA file
pub fn file_n50(infile: &str) -> anyhow::Result<usize> {
    Ok(n50(&contig_lengths(infile)?))
}
