use indexmap::IndexMap;
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;

use super::cc::{cluster, cluster_matrix, Cluster};
use super::config::DerepConfig;
use super::count::reduce_to_count;
use crate::libs::dist::DistanceProvider;

/// The result of a dereplication run
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    /// Every input, sorted
    pub inputs: Vec<String>,
    /// Kept assemblies, sorted
    pub survivors: Vec<String>,
    /// Removed assembly => the one that was kept in its place
    pub absorbed_by: IndexMap<String, String>,
    /// Number of batched passes
    pub iterations: usize,
}

impl Outcome {
    /// Everything kept, nothing computed
    pub fn unchanged(ids: &[String]) -> Self {
        let inputs: Vec<String> = ids.iter().cloned().sorted().dedup().collect();
        Self {
            survivors: inputs.clone(),
            inputs,
            ..Self::default()
        }
    }

    pub fn removed(&self) -> usize {
        self.absorbed_by.len()
    }

    /// The survivor standing in for `id`, following removals across passes
    pub fn representative_of<'a>(&'a self, id: &'a str) -> &'a str {
        let mut current = id;
        while let Some(next) = self.absorbed_by.get(current) {
            current = next.as_str();
        }
        current
    }

    /// `(representative, member)` for every input, survivors paired with themselves
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.inputs
            .iter()
            .map(|id| (self.representative_of(id).to_string(), id.to_string()))
            .sorted()
            .collect()
    }

    fn absorb(&mut self, removed: &str, kept: &str) {
        self.absorbed_by
            .insert(removed.to_string(), kept.to_string());
    }

    // Removes at most `budget` members, the worst ones of each cluster first.
    // Returns the number of removed members.
    fn absorb_clusters<F>(&mut self, clusters: &[Cluster], quality: F, budget: &mut usize) -> usize
    where
        F: Fn(&str) -> usize,
    {
        let mut removed = 0;
        for c in clusters {
            if c.is_singleton() {
                trace!("{}*", c.representative);
                continue;
            }
            debug!(
                "cluster of {} assemblies: {}* (N50 = {}), {}",
                c.len(),
                c.representative,
                quality(&c.representative),
                c.removed.join(",")
            );
            let worst_first = c
                .removed
                .iter()
                .sorted_by(|a, b| {
                    quality(a.as_str())
                        .cmp(&quality(b.as_str()))
                        .then_with(|| b.cmp(a))
                });
            for member in worst_first {
                if *budget == 0 {
                    return removed;
                }
                self.absorb(member, &c.representative);
                *budget -= 1;
                removed += 1;
            }
        }
        removed
    }
}

/// Dereplicates in random batches of bounded size, then once more over everything left.
///
/// Each batched pass shuffles the working set, splits it into chunks of `batch_size` and handles
/// every chunk on its own. Removals are applied after the whole pass. Passes repeat until one
/// removes nothing, the working set fits in a single batch, or the count target is reached.
///
/// With a threshold, each chunk is clustered and only representatives stay. The final, unbatched
/// pass makes sure no two survivors are closer than the threshold. A count target only stops the
/// run early: it never removes assemblies that are farther apart than the threshold.
///
/// With only a count target, each chunk is thinned by closest pairs in proportion to the target,
/// and the final pass brings the survivors to exactly the target.
pub struct BatchScheduler<'a, D: ?Sized, F> {
    provider: &'a D,
    quality: F,
    config: &'a DerepConfig,
}

fn reached(target: Option<usize>, len: usize) -> bool {
    target.map_or(false, |count| len <= count)
}

impl<'a, D, F> BatchScheduler<'a, D, F>
where
    D: DistanceProvider + ?Sized,
    F: Fn(&str) -> usize,
{
    pub fn new(provider: &'a D, quality: F, config: &'a DerepConfig) -> Self {
        Self {
            provider,
            quality,
            config,
        }
    }

    pub fn run<R: Rng + ?Sized>(&self, ids: &[String], rng: &mut R) -> anyhow::Result<Outcome> {
        let mut working: Vec<String> = ids.iter().cloned().sorted().dedup().collect();
        let mut outcome = Outcome {
            inputs: working.clone(),
            ..Outcome::default()
        };
        let total = working.len();
        let target = self.config.target_count(total);
        let batch_size = self.config.batch_size;

        if !self.config.needs_distances(total) {
            info!("{} assemblies, nothing to dereplicate", total);
            outcome.survivors = working;
            return Ok(outcome);
        }

        while working.len() > batch_size && !reached(target, working.len()) {
            outcome.iterations += 1;
            info!(
                "Running dereplication on random batches of {} assemblies...",
                batch_size
            );
            let removed = self.batched_pass(&mut working, target, rng, &mut outcome)?;
            if removed == 0 {
                info!("  nothing removed");
                break;
            }
            info!("  {} removed, {} assemblies remain", removed, working.len());
        }
        working.sort();

        if reached(target, working.len()) {
            info!("Reached the target of {} assemblies", working.len());
        } else {
            if total <= batch_size {
                info!("Running dereplication on all {} assemblies...", working.len());
            } else {
                info!(
                    "Running a final dereplication on all {} assemblies...",
                    working.len()
                );
            }
            self.final_pass(&mut working, target, &mut outcome)?;
        }

        outcome.survivors = working;
        Ok(outcome)
    }

    /// One shuffled pass over the working set; returns the number removed
    fn batched_pass<R: Rng + ?Sized>(
        &self,
        working: &mut Vec<String>,
        target: Option<usize>,
        rng: &mut R,
        outcome: &mut Outcome,
    ) -> anyhow::Result<usize> {
        working.shuffle(rng);

        let len = working.len();
        // removals left before the count target is hit
        let mut budget = target.map_or(usize::MAX, |count| len.saturating_sub(count));
        let mut removed = 0;
        for batch in working.chunks(self.config.batch_size) {
            if budget == 0 {
                break;
            }
            removed += match (self.config.threshold, target) {
                (Some(threshold), _) => {
                    let clusters = cluster(batch, self.provider, &self.quality, threshold)?;
                    outcome.absorb_clusters(&clusters, &self.quality, &mut budget)
                }
                (None, Some(count)) => {
                    let keep = (batch.len() * count / len).max(1);
                    self.thin_batch(batch, keep, &mut budget, outcome)?
                }
                (None, None) => 0,
            };
        }

        // batches are disjoint, so applying all removals at the end is the same as one by one
        working.retain(|id| !outcome.absorbed_by.contains_key(id));
        Ok(removed)
    }

    /// Closest-pair reduction of one batch down to `keep`, spending at most `budget` removals
    fn thin_batch(
        &self,
        batch: &[String],
        keep: usize,
        budget: &mut usize,
        outcome: &mut Outcome,
    ) -> anyhow::Result<usize> {
        if batch.len() < 2 {
            return Ok(0);
        }
        let keep = keep.max(batch.len().saturating_sub(*budget));
        if keep >= batch.len() {
            return Ok(0);
        }

        let ids: Vec<String> = batch.iter().cloned().sorted().collect();
        let matrix = self.provider.matrix(&ids)?;
        let removals = reduce_to_count(&matrix, &self.quality, keep)?;
        for (removed, kept) in &removals {
            outcome.absorb(removed, kept);
        }
        *budget -= removals.len();

        Ok(removals.len())
    }

    fn final_pass(
        &self,
        working: &mut Vec<String>,
        target: Option<usize>,
        outcome: &mut Outcome,
    ) -> anyhow::Result<()> {
        if working.len() < 2 {
            return Ok(());
        }

        let matrix = self.provider.matrix(working)?;

        match (self.config.threshold, target) {
            (Some(threshold), _) => {
                let mut budget =
                    target.map_or(usize::MAX, |count| working.len().saturating_sub(count));
                let clusters = cluster_matrix(&matrix, &self.quality, threshold)?;
                outcome.absorb_clusters(&clusters, &self.quality, &mut budget);
            }
            (None, Some(count)) => {
                info!(
                    "Reducing {} assemblies to the {} most distinct...",
                    working.len(),
                    count
                );
                for (removed, kept) in reduce_to_count(&matrix, &self.quality, count)? {
                    outcome.absorb(&removed, &kept);
                }
            }
            (None, None) => {}
        }
        working.retain(|id| !outcome.absorbed_by.contains_key(id));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::clust::cc::single_linkage;
    use crate::libs::matrix::DistMatrix;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Remembers the size of every request
    struct Recorder<'a> {
        inner: &'a DistMatrix,
        sizes: RefCell<Vec<usize>>,
    }

    impl DistanceProvider for Recorder<'_> {
        fn matrix(&self, ids: &[String]) -> anyhow::Result<DistMatrix> {
            self.sizes.borrow_mut().push(ids.len());
            self.inner.matrix(ids)
        }
    }

    fn abc() -> (DistMatrix, HashMap<String, usize>) {
        let ids: Vec<String> = vec!["A".into(), "B".into(), "C".into()];
        let mut m = DistMatrix::new(&ids);
        m.set_by_name("A", "B", 0.002);
        m.set_by_name("A", "C", 0.05);
        m.set_by_name("B", "C", 0.05);
        let quality = HashMap::from([("A".into(), 10), ("B".into(), 5), ("C".into(), 1)]);
        (m, quality)
    }

    // Points scattered on a line, with random N50s
    fn scattered(n: usize, seed: u64) -> (DistMatrix, HashMap<String, usize>) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let ids: Vec<String> = (0..n).map(|i| format!("asm{:03}.fa", i)).collect();
        let pos: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..1.0)).collect();
        let mut m = DistMatrix::new(&ids);
        for i in 0..n {
            for j in (i + 1)..n {
                m.set(i, j, (pos[i] - pos[j]).abs());
            }
        }
        let quality = ids
            .iter()
            .map(|id| (id.clone(), rng.gen_range(1..50)))
            .collect();
        (m, quality)
    }

    fn run(
        m: &DistMatrix,
        quality: &HashMap<String, usize>,
        config: &DerepConfig,
        ids: &[String],
    ) -> Outcome {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        BatchScheduler::new(m, |id: &str| quality[id], config)
            .run(ids, &mut rng)
            .unwrap()
    }

    fn all_ids(m: &DistMatrix) -> Vec<String> {
        m.names().into_iter().cloned().collect()
    }

    #[test]
    fn test_example_small_threshold() {
        let (m, quality) = abc();
        let config = DerepConfig::with_threshold(0.005);
        let outcome = run(&m, &quality, &config, &all_ids(&m));
        assert_eq!(outcome.survivors, vec!["A", "C"]);
        assert_eq!(outcome.removed(), 1);

        // idempotent
        let again = run(&m, &quality, &config, &outcome.survivors);
        assert_eq!(again.survivors, outcome.survivors);
        assert_eq!(again.removed(), 0);
    }

    #[test]
    fn test_example_large_threshold() {
        let (m, quality) = abc();
        let outcome = run(&m, &quality, &DerepConfig::with_threshold(0.1), &all_ids(&m));
        assert_eq!(outcome.survivors, vec!["A"]);
        assert_eq!(
            outcome.pairs(),
            vec![
                ("A".to_string(), "A".to_string()),
                ("A".to_string(), "B".to_string()),
                ("A".to_string(), "C".to_string()),
            ]
        );
    }

    #[test]
    fn test_batch_size_one() {
        let (m, quality) = scattered(60, 7);
        let ids = all_ids(&m);

        let unbatched = run(&m, &quality, &DerepConfig::with_threshold(0.01), &ids);
        let config = DerepConfig {
            batch_size: 1,
            ..DerepConfig::with_threshold(0.01)
        };
        let recorder = Recorder {
            inner: &m,
            sizes: RefCell::new(vec![]),
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let batched = BatchScheduler::new(&recorder, |id: &str| quality[id], &config)
            .run(&ids, &mut rng)
            .unwrap();

        assert_eq!(batched.survivors, unbatched.survivors);
        assert_eq!(batched.iterations, 1);
        // singletons never reach the provider; only the final pass does
        assert_eq!(*recorder.sizes.borrow(), vec![60]);
    }

    #[test]
    fn test_global_postcondition() {
        for seed in 0..5 {
            let (m, quality) = scattered(80, seed);
            let ids = all_ids(&m);
            for batch_size in [1, 2, 5, 13, 40, 80, 1000] {
                let config = DerepConfig {
                    batch_size,
                    seed,
                    ..DerepConfig::with_threshold(0.02)
                };
                let outcome = run(&m, &quality, &config, &ids);
                let s = &outcome.survivors;
                assert!(!s.is_empty());
                for i in 0..s.len() {
                    for j in (i + 1)..s.len() {
                        let d = m.get_by_name(&s[i], &s[j]).unwrap();
                        assert!(d >= 0.02, "{} {} {}", s[i], s[j], d);
                    }
                }
                assert_eq!(outcome.survivors.len() + outcome.removed(), 80);
            }
        }
    }

    #[test]
    fn test_batches_are_bounded() {
        let (m, quality) = scattered(100, 3);
        let ids = all_ids(&m);
        let config = DerepConfig {
            batch_size: 16,
            ..DerepConfig::with_threshold(0.005)
        };
        let recorder = Recorder {
            inner: &m,
            sizes: RefCell::new(vec![]),
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let outcome = BatchScheduler::new(&recorder, |id: &str| quality[id], &config)
            .run(&ids, &mut rng)
            .unwrap();

        let sizes = recorder.sizes.borrow();
        let (last, batches) = sizes.split_last().unwrap();
        assert!(batches.iter().all(|&s| s <= 16));
        assert!(outcome.iterations >= 1);
        // the final pass sees whatever survived the batches
        assert!(*last >= outcome.survivors.len());
    }

    #[test]
    fn test_idempotent() {
        for seed in 0..5 {
            let (m, quality) = scattered(70, seed + 100);
            let config = DerepConfig {
                batch_size: 9,
                seed,
                ..DerepConfig::with_threshold(0.03)
            };
            let first = run(&m, &quality, &config, &all_ids(&m));
            let second = run(&m, &quality, &config, &first.survivors);
            assert_eq!(first.survivors, second.survivors);
            assert_eq!(second.removed(), 0);
        }
    }

    #[test]
    fn test_representative_quality() {
        let (m, quality) = scattered(90, 11);
        let threshold = 0.015;
        let config = DerepConfig {
            batch_size: 7,
            ..DerepConfig::with_threshold(threshold)
        };
        let outcome = run(&m, &quality, &config, &all_ids(&m));

        let components = single_linkage(&m, threshold).unwrap();
        let mut component_of = HashMap::new();
        for (c, members) in components.iter().enumerate() {
            for &i in members {
                component_of.insert(m.name(i).to_string(), c);
            }
        }

        for removed in outcome.absorbed_by.keys() {
            let rep = outcome.representative_of(removed);
            assert!(outcome.survivors.contains(&rep.to_string()));
            assert!(quality[rep] >= quality[removed]);
            assert_eq!(component_of[rep], component_of[removed]);
        }

        // the best assembly overall always survives
        let best = m
            .names()
            .into_iter()
            .max_by(|a, b| quality[*a].cmp(&quality[*b]).then_with(|| b.cmp(a)))
            .unwrap();
        assert!(outcome.survivors.contains(best));
    }

    #[test]
    fn test_reproducible_with_seed() {
        let (m, quality) = scattered(60, 5);
        let config = DerepConfig {
            batch_size: 8,
            seed: 42,
            ..DerepConfig::with_threshold(0.02)
        };
        let one = run(&m, &quality, &config, &all_ids(&m));
        let two = run(&m, &quality, &config, &all_ids(&m));
        assert_eq!(one.survivors, two.survivors);
        assert_eq!(one.absorbed_by, two.absorbed_by);
    }

    #[test]
    fn test_count_target() {
        let (m, quality) = scattered(40, 21);
        let ids = all_ids(&m);
        for count in [1, 5, 17, 39] {
            let config = DerepConfig {
                count: Some(count),
                batch_size: 6,
                ..DerepConfig::default()
            };
            let outcome = run(&m, &quality, &config, &ids);
            assert_eq!(outcome.survivors.len(), count);
            for removed in outcome.absorbed_by.keys() {
                assert!(quality[outcome.representative_of(removed)] >= quality[removed]);
            }
        }

        // already small enough: nothing is computed
        let config = DerepConfig {
            count: Some(40),
            ..DerepConfig::default()
        };
        let recorder = Recorder {
            inner: &m,
            sizes: RefCell::new(vec![]),
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let outcome = BatchScheduler::new(&recorder, |id: &str| quality[id], &config)
            .run(&ids, &mut rng)
            .unwrap();
        assert_eq!(outcome.survivors.len(), 40);
        assert!(recorder.sizes.borrow().is_empty());
    }

    #[test]
    fn test_count_batches_are_bounded() {
        let (m, quality) = scattered(40, 4);
        let ids = all_ids(&m);
        let config = DerepConfig {
            count: Some(5),
            batch_size: 6,
            ..DerepConfig::default()
        };
        let recorder = Recorder {
            inner: &m,
            sizes: RefCell::new(vec![]),
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let outcome = BatchScheduler::new(&recorder, |id: &str| quality[id], &config)
            .run(&ids, &mut rng)
            .unwrap();

        assert_eq!(outcome.survivors.len(), 5);
        assert!(outcome.iterations >= 1);
        let sizes = recorder.sizes.borrow();
        assert!(!sizes.is_empty());
        assert!(sizes.iter().all(|&s| s <= 6), "{:?}", sizes);
    }

    #[test]
    fn test_count_one_keeps_best() {
        let (m, quality) = abc();
        let config = DerepConfig {
            count: Some(1),
            ..DerepConfig::default()
        };
        let outcome = run(&m, &quality, &config, &all_ids(&m));
        assert_eq!(outcome.survivors, vec!["A"]);
    }

    #[test]
    fn test_distance_reached_before_count() {
        let (m, quality) = abc();

        // the distance leaves {A, C}, far apart; the count of one is not pursued further
        let config = DerepConfig {
            count: Some(1),
            ..DerepConfig::with_threshold(0.005)
        };
        let outcome = run(&m, &quality, &config, &all_ids(&m));
        assert_eq!(outcome.survivors, vec!["A", "C"]);
        assert_eq!(outcome.representative_of("B"), "A");
    }

    #[test]
    fn test_count_reached_before_distance() {
        let (m, quality) = abc();

        // one cluster of three; stopping at two drops the worst member only
        let config = DerepConfig {
            count: Some(2),
            ..DerepConfig::with_threshold(0.1)
        };
        let outcome = run(&m, &quality, &config, &all_ids(&m));
        assert_eq!(outcome.survivors, vec!["A", "B"]);
        assert_eq!(outcome.representative_of("C"), "A");
    }

    #[test]
    fn test_count_covers_input_with_distance() {
        let (m, quality) = abc();
        let config = DerepConfig {
            count: Some(3),
            ..DerepConfig::with_threshold(0.1)
        };
        let recorder = Recorder {
            inner: &m,
            sizes: RefCell::new(vec![]),
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let outcome = BatchScheduler::new(&recorder, |id: &str| quality[id], &config)
            .run(&all_ids(&m), &mut rng)
            .unwrap();
        assert_eq!(outcome.survivors, vec!["A", "B", "C"]);
        assert!(recorder.sizes.borrow().is_empty());
    }

    #[test]
    fn test_distance_and_count_batched() {
        for seed in 0..5 {
            let (m, quality) = scattered(80, seed + 200);
            let threshold = 0.02;
            for count in [10, 30, 60] {
                let config = DerepConfig {
                    count: Some(count),
                    batch_size: 9,
                    seed,
                    ..DerepConfig::with_threshold(threshold)
                };
                let outcome = run(&m, &quality, &config, &all_ids(&m));
                let s = &outcome.survivors;
                assert!(s.len() >= count);
                if s.len() > count {
                    // stopped by the distance
                    for i in 0..s.len() {
                        for j in (i + 1)..s.len() {
                            assert!(m.get_by_name(&s[i], &s[j]).unwrap() >= threshold);
                        }
                    }
                }
                for removed in outcome.absorbed_by.keys() {
                    let rep = outcome.representative_of(removed);
                    assert!(quality[rep] >= quality[removed]);
                }
            }
        }
    }

    #[test]
    fn test_fraction_target() {
        let (m, quality) = scattered(20, 8);
        let config = DerepConfig {
            fraction: Some(0.25),
            ..DerepConfig::default()
        };
        let outcome = run(&m, &quality, &config, &all_ids(&m));
        assert_eq!(outcome.survivors.len(), 5);
    }

    #[test]
    fn test_empty_and_single() {
        let (m, quality) = abc();
        let config = DerepConfig::with_threshold(0.1);

        let outcome = run(&m, &quality, &config, &[]);
        assert!(outcome.survivors.is_empty());

        let outcome = run(&m, &quality, &config, &["B".to_string()]);
        assert_eq!(outcome.survivors, vec!["B"]);
    }

    #[test]
    fn test_missing_distance_is_fatal() {
        let ids: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let mut m = DistMatrix::new(&ids);
        m.set_by_name("a", "b", 0.5);
        m.set_by_name("a", "c", 0.5);
        let quality: HashMap<String, usize> =
            HashMap::from([("a".into(), 1), ("b".into(), 1), ("c".into(), 1)]);

        let config = DerepConfig::with_threshold(0.1);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let result = BatchScheduler::new(&m, |id: &str| quality[id], &config).run(&ids, &mut rng);
        assert!(result.is_err());
    }
}
