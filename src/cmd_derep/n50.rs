use clap::*;
use rayon::prelude::*;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("n50")
        .about("Reports the N50 of assemblies")
        .after_help(
            r###"
This command prints the N50 of each input file, the quality measure used by `derep run`.

N50 is the length of the shortest sequence among the longest ones that together cover at least
half of the total length.

Notes:
* Supports both plain text and gzipped (.gz) files
* Reads from stdin if input file is 'stdin'
* Empty files have an N50 of 0

Examples:
1. A single assembly:
   derep n50 genome.fa

2. Several, sorted by N50:
   derep n50 genomes/*.fna.gz | sort -k2,2nr

"###,
        )
        .arg(
            Arg::new("infiles")
                .required(true)
                .num_args(1..)
                .index(1)
                .help("Input FASTA file(s) to process"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = derep::writer(args.get_one::<String>("outfile").unwrap())?;
    let infiles: Vec<&String> = args.get_many::<String>("infiles").unwrap().collect();

    let n50s = infiles
        .par_iter()
        .map(|infile| derep::libs::stat::file_n50(infile))
        .collect::<anyhow::Result<Vec<_>>>()?;

    for (infile, n50) in infiles.iter().zip(n50s) {
        writer.write_fmt(format_args!("{}\t{}\n", infile, n50))?;
    }

    Ok(())
}
