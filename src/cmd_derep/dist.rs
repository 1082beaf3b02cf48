use clap::*;
use derep::libs::dist::{DistanceProvider, Mash};
use itertools::Itertools;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("dist")
        .about("Computes pairwise Mash distances")
        .after_help(
            r###"
This command runs `mash sketch` and `mash dist` over the input files and prints every pair once.

Output format:
    name1<TAB>name2<TAB>distance

The output can be given to `derep run --dist`.

Notes:
* `mash` must be in PATH
* Duplicated inputs are counted once

Examples:
1. All pairs among the assemblies in a directory:
   derep dist genomes/*.fa -o dist.tsv

2. With a smaller sketch:
   derep dist genomes/*.fa --sketch-size 1000

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
            Arg::new("sketch_size")
                .long("sketch-size")
                .num_args(1)
                .default_value("10000")
                .value_parser(value_parser!(usize))
                .help("Mash sketch size"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .short('t')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .help("Number of threads for mash [default: CPUs, at most 16]"),
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

    let ids: Vec<String> = args
        .get_many::<String>("infiles")
        .unwrap()
        .cloned()
        .sorted()
        .dedup()
        .collect();
    let sketch_size = *args.get_one::<usize>("sketch_size").unwrap();
    let threads = args
        .get_one::<usize>("threads")
        .copied()
        .unwrap_or_else(|| num_cpus::get().min(16));

    let mash = Mash::new(threads, sketch_size)?;
    let matrix = mash.matrix(&ids)?;

    for i in 0..matrix.size() {
        for j in (i + 1)..matrix.size() {
            writer.write_fmt(format_args!(
                "{}\t{}\t{}\n",
                matrix.name(i),
                matrix.name(j),
                matrix.get(i, j)
            ))?;
        }
    }

    Ok(())
}
