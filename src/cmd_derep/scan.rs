use clap::*;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("scan")
        .about("Lists the assemblies found in a directory")
        .after_help(
            r###"
This command prints the path of every assembly `derep run` would pick up from <in_dir>.

Notes:
* Subdirectories are searched recursively
* Recognized extensions: .fasta, .fna, .fa, each optionally gzipped (.gz)
* Paths are sorted
* Fails when two files share a name

Examples:
1. Count the assemblies:
   derep scan genomes/ | wc -l

"###,
        )
        .arg(
            Arg::new("in_dir")
                .required(true)
                .index(1)
                .help("Directory containing all assemblies"),
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
    let in_dir = args.get_one::<String>("in_dir").unwrap();

    for id in derep::libs::assembly::find_assemblies(in_dir)? {
        writer.write_fmt(format_args!("{}\n", id))?;
    }

    Ok(())
}
