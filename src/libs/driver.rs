use anyhow::Context;
use rand::SeedableRng;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::libs::assembly::{file_name, Assembly};
use crate::libs::clust::{BatchScheduler, DerepConfig, Outcome};
use crate::libs::dist::DistanceProvider;

/// Runs the batched dereplication over loaded assemblies, N50 as quality.
///
/// The shuffles are driven by a `Xoshiro256PlusPlus` seeded from `config.seed`, so the same inputs
/// and settings always give the same survivors.
pub fn dereplicate<D>(
    assemblies: &[Assembly],
    provider: &D,
    config: &DerepConfig,
) -> anyhow::Result<Outcome>
where
    D: DistanceProvider + ?Sized,
{
    config.validate()?;

    let n50_of: HashMap<&str, usize> = assemblies
        .iter()
        .map(|a| (a.id.as_str(), a.n50))
        .collect();
    let ids: Vec<String> = assemblies.iter().map(|a| a.id.clone()).collect();

    // every id handed to the scheduler comes from `assemblies`
    let quality = |id: &str| n50_of[id];
    let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(config.seed);
    let scheduler = BatchScheduler::new(provider, quality, config);

    scheduler.run(&ids, &mut rng)
}

/// Copies every survivor into `out_dir`, keeping its file name.
///
/// `out_dir` is created when missing. Returns the number of files copied.
pub fn export<P: AsRef<Path>>(survivors: &[String], out_dir: P) -> anyhow::Result<usize> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    for id in survivors {
        let target = out_dir.join(file_name(id));
        fs::copy(id, &target)
            .with_context(|| format!("Failed to copy {} to {}", id, target.display()))?;
    }

    Ok(survivors.len())
}

/// Writes `representative<TAB>member` for every input, by file name
pub fn write_clusters(outcome: &Outcome, writer: &mut dyn Write) -> anyhow::Result<()> {
    for (representative, member) in outcome.pairs() {
        writer.write_fmt(format_args!(
            "{}\t{}\n",
            file_name(&representative),
            file_name(&member)
        ))?;
    }
    Ok(())
}
