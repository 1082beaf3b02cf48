extern crate clap;
use clap::*;

#[macro_use]
extern crate log;

mod cmd_derep;

fn main() -> anyhow::Result<()> {
    let app = Command::new("derep")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`derep` - Dereplicate genome assemblies by Mash distance and N50")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("More progress messages on stderr (-v debug, -vv trace)"),
        )
        .subcommand(cmd_derep::run::make_subcommand())
        .subcommand(cmd_derep::n50::make_subcommand())
        .subcommand(cmd_derep::scan::make_subcommand())
        .subcommand(cmd_derep::dist::make_subcommand())
        .after_help(
            r###"Subcommand groups:

* Dereplication:
    * run  - Dereplicate a directory of assemblies

* Inspection:
    * n50  - N50 of assemblies
    * scan - Assemblies found in a directory
    * dist - Pairwise Mash distances

"###,
        );

    let matches = app.get_matches();
    let verbose = match matches.subcommand() {
        Some((_, sub_matches)) => sub_matches.get_count("verbose"),
        None => matches.get_count("verbose"),
    };
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    // Check which subcomamnd the user ran...
    match matches.subcommand() {
        Some(("run", sub_matches)) => cmd_derep::run::execute(sub_matches),
        Some(("n50", sub_matches)) => cmd_derep::n50::execute(sub_matches),
        Some(("scan", sub_matches)) => cmd_derep::scan::execute(sub_matches),
        Some(("dist", sub_matches)) => cmd_derep::dist::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
