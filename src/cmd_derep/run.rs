use clap::*;
use derep::libs::assembly::{find_assemblies, load_assemblies};
use derep::libs::clust::{DerepConfig, Outcome};
use derep::libs::dist::{DistanceProvider, Mash, PairTable};
use derep::libs::driver;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("run")
        .about("Dereplicates the assemblies in a directory")
        .after_help(
            r###"
This command finds all assemblies under <in_dir> (recursively), removes near-duplicates, and copies
the remaining ones to <out_dir>.

Assemblies closer than --distance are linked, and only the one with the largest N50 is kept from
each linked group. Ties go to the smaller file path. --count and --fraction cap the number of
survivors; with only these, the closest pairs are thinned first. With --distance as well,
dereplication stops at whichever target is reached first: once no two assemblies are closer than
--distance, or once few enough remain. A count that already covers the input copies everything.

Large inputs are processed in random batches of --batch-size, then once more over everything left.
The result only depends on the inputs, the targets, --batch-size and --seed.

Notes:
* Recognized extensions: .fasta, .fna, .fa, each optionally gzipped (.gz)
* File names must be unique across <in_dir>
* Distances come from `mash` (must be in PATH) unless --dist is given
* --dist takes `name1<TAB>name2<TAB>distance` lines, as written by `derep dist`
* --clusters writes `representative<TAB>member` for every input
* The summary goes to stdout, progress to stderr (-v, -vv for more)

Examples:
1. Remove assemblies within 0.005 Mash distance of a better one:
   derep run genomes/ derep/ --distance 0.005

2. Keep the 100 most distinct assemblies:
   derep run genomes/ derep/ --count 100

3. Both, in batches of 5000, with a cluster report:
   derep run genomes/ derep/ --distance 0.001 --count 100 --batch-size 5000 --clusters clusters.tsv

4. Use precomputed distances:
   derep dist genomes/*.fa > dist.tsv
   derep run genomes/ derep/ --distance 0.005 --dist dist.tsv

"###,
        )
        .arg(
            Arg::new("in_dir")
                .required(true)
                .index(1)
                .help("Directory containing all assemblies"),
        )
        .arg(
            Arg::new("out_dir")
                .required(true)
                .index(2)
                .help("Directory where dereplicated assemblies will be copied"),
        )
        .arg(
            Arg::new("distance")
                .long("distance")
                .visible_alias("threshold")
                .num_args(1)
                .value_parser(value_parser!(f64))
                .help("Dereplicate until no two assemblies are closer than this Mash distance"),
        )
        .arg(
            Arg::new("count")
                .long("count")
                .num_args(1)
                .value_parser(value_parser!(usize))
                .help("Dereplicate until at most this many assemblies remain"),
        )
        .arg(
            Arg::new("fraction")
                .long("fraction")
                .num_args(1)
                .value_parser(value_parser!(f64))
                .help("Dereplicate until at most this fraction of assemblies remain"),
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
            Arg::new("batch_size")
                .long("batch-size")
                .num_args(1)
                .default_value("1000000")
                .value_parser(value_parser!(usize))
                .help("Dereplicate in random batches of this size"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .short('t')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .help("Number of threads for mash and N50 [default: CPUs, at most 16]"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .num_args(1)
                .default_value("0")
                .value_parser(value_parser!(u64))
                .help("Random seed for the batch shuffles"),
        )
        .arg(
            Arg::new("dist")
                .long("dist")
                .num_args(1)
                .help("Read distances from this file instead of running mash"),
        )
        .arg(
            Arg::new("clusters")
                .long("clusters")
                .num_args(1)
                .help("Write the representative of every assembly to this file"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let in_dir = args.get_one::<String>("in_dir").unwrap();
    let out_dir = args.get_one::<String>("out_dir").unwrap();

    let config = DerepConfig {
        threshold: args.get_one::<f64>("distance").copied(),
        count: args.get_one::<usize>("count").copied(),
        fraction: args.get_one::<f64>("fraction").copied(),
        batch_size: *args.get_one::<usize>("batch_size").unwrap(),
        seed: *args.get_one::<u64>("seed").unwrap(),
    };
    config.validate()?;

    let sketch_size = *args.get_one::<usize>("sketch_size").unwrap();
    let threads = args
        .get_one::<usize>("threads")
        .copied()
        .unwrap_or_else(|| num_cpus::get().min(16));
    // checked even when --dist replaces mash
    Mash::check_settings(threads, sketch_size)?;

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()?;

    //----------------------------
    // Ops
    //----------------------------
    info!("Looking for assemblies in {}", in_dir);
    let ids = find_assemblies(in_dir)?;
    if ids.is_empty() {
        warn!("No assemblies found in {}", in_dir);
    } else {
        info!("Found {} assemblies", ids.len());
    }

    let outcome = if config.needs_distances(ids.len()) {
        let provider: Box<dyn DistanceProvider> = match args.get_one::<String>("dist") {
            Some(file) => Box::new(PairTable::from_path(file)?),
            None => Box::new(Mash::new(threads, sketch_size)?),
        };

        info!("Loading N50 values...");
        let assemblies = load_assemblies(&ids)?;

        driver::dereplicate(&assemblies, provider.as_ref(), &config)?
    } else {
        info!("Nothing to dereplicate, copying all assemblies");
        Outcome::unchanged(&ids)
    };

    //----------------------------
    // Output
    //----------------------------
    info!("Copying assemblies to {}", out_dir);
    let kept = driver::export(&outcome.survivors, out_dir)?;

    if let Some(outfile) = args.get_one::<String>("clusters") {
        let mut writer = derep::writer(outfile)?;
        driver::write_clusters(&outcome, &mut writer)?;
    }

    println!("Final dereplication: {} / {} assemblies", kept, ids.len());

    Ok(())
}
