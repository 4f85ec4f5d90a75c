//! Parallel replication runner
//!
//! Replications are independent: each builds its own [`Model`] (clock,
//! pools, random source, specimens) and shares only the read-only
//! `Arc<Config>` and a [`Progress`] counter. Seeds are drawn up front from
//! a master source seeded with `config.seed`, so results do not depend on
//! how rayon schedules the work.

use super::engine::{Model, SimulationError};
use super::results::ReplicationResult;
use crate::config::Config;
use crate::rng::RandomSource;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// Shared progress counters, safe to poll from another thread.
#[derive(Debug, Default)]
pub struct Progress {
    replications_done: AtomicUsize,
    specimens_completed: AtomicUsize,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replications_done(&self) -> usize {
        self.replications_done.load(Ordering::Relaxed)
    }

    pub fn specimens_completed(&self) -> usize {
        self.specimens_completed.load(Ordering::Relaxed)
    }

    pub(crate) fn specimen_completed(&self) {
        self.specimens_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn replication_done(&self) {
        self.replications_done.fetch_add(1, Ordering::Relaxed);
    }
}

/// One seed per replication, derived from the master seed.
pub fn replication_seeds(master: u64, count: usize) -> Vec<u64> {
    let mut random = RandomSource::new(master);
    (0..count).map(|_| random.next_u64()).collect()
}

/// Run `config.num_reps` replications in parallel.
///
/// Results come back in replication order. If any replication fails, the
/// error of the lowest-numbered failing replication is returned.
pub fn run_replications(
    config: Arc<Config>,
    progress: Arc<Progress>,
) -> Result<Vec<ReplicationResult>, SimulationError> {
    config.validate()?;
    let seeds = replication_seeds(config.seed, config.num_reps);
    info!(
        replications = config.num_reps,
        seed = config.seed,
        "starting replications"
    );

    let results: Vec<Result<ReplicationResult, SimulationError>> = seeds
        .into_par_iter()
        .enumerate()
        .map(|(replication, seed)| {
            let result = run_one(Arc::clone(&config), replication, seed, Arc::clone(&progress));
            progress.replication_done();
            result.map_err(|e| SimulationError::Replication {
                replication,
                source: Box::new(e),
            })
        })
        .collect();

    results.into_iter().collect()
}

fn run_one(
    config: Arc<Config>,
    replication: usize,
    seed: u64,
    progress: Arc<Progress>,
) -> Result<ReplicationResult, SimulationError> {
    let mut model = Model::new(config, seed)?
        .with_replication(replication)
        .with_progress(progress);
    model.run()?;
    Ok(model.results())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replication_seeds_are_reproducible_and_distinct() {
        let a = replication_seeds(42, 5);
        let b = replication_seeds(42, 5);
        assert_eq!(a, b);

        let mut unique = a.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 5);

        assert_ne!(replication_seeds(43, 5), a);
    }

    #[test]
    fn test_progress_counters() {
        let progress = Progress::new();
        progress.specimen_completed();
        progress.specimen_completed();
        progress.replication_done();
        assert_eq!(progress.specimens_completed(), 2);
        assert_eq!(progress.replications_done(), 1);
    }
}
