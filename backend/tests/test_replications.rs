//! Parallel replications and reproducibility

mod common;

use common::{stochastic_config, unit_config, wip};
use hpath_sim_core::models::{Priority, Source, Stage};
use hpath_sim_core::orchestrator::replication_seeds;
use hpath_sim_core::{
    run_replications, ConfigError, Distribution, Progress, SamplingError, SimulationError, Task,
};
use std::sync::Arc;

fn digests(results: &[hpath_sim_core::ReplicationResult]) -> Vec<String> {
    results.iter().map(|r| r.digest().unwrap()).collect()
}

#[test]
fn test_replications_are_reproducible() {
    let mut config = stochastic_config();
    config.num_reps = 4;
    let config = Arc::new(config);

    let first = run_replications(Arc::clone(&config), Arc::new(Progress::new())).unwrap();
    let second = run_replications(Arc::clone(&config), Arc::new(Progress::new())).unwrap();

    assert_eq!(first.len(), 4);
    assert_eq!(digests(&first), digests(&second));
    assert_eq!(first, second);
}

#[test]
fn test_replications_are_ordered_and_distinct() {
    let mut config = stochastic_config();
    config.num_reps = 3;
    config.seed = 1234;
    let results = run_replications(Arc::new(config), Arc::new(Progress::new())).unwrap();

    let seeds = replication_seeds(1234, 3);
    for (index, result) in results.iter().enumerate() {
        assert_eq!(result.replication, index);
        assert_eq!(result.seed, seeds[index]);
    }

    let mut unique = digests(&results);
    unique.dedup();
    assert_eq!(unique.len(), 3);
}

#[test]
fn test_progress_counts_everything() {
    let mut config = stochastic_config();
    config.num_reps = 3;
    let progress = Arc::new(Progress::new());
    let results = run_replications(Arc::new(config), Arc::clone(&progress)).unwrap();

    assert_eq!(progress.replications_done(), 3);
    let completed: usize = results.iter().map(|r| r.completed).sum();
    assert_eq!(progress.specimens_completed(), completed);
}

#[test]
fn test_results_report_resources_and_in_progress() {
    let mut config = unit_config();
    config.sim_hours = 30.0;
    config.wip = vec![
        wip(Stage::Reception, Priority::Routine, Source::Internal, 3),
        wip(Stage::Scanning, Priority::Urgent, Source::External, 1),
    ];
    let results = run_replications(Arc::new(config), Arc::new(Progress::new())).unwrap();
    let result = &results[0];

    assert_eq!(result.specimens.len(), 4);
    assert_eq!(result.end_time, 30.0);
    assert_eq!(result.completed + result.in_progress(), 4);
    assert!(result.specimens.iter().filter(|s| s.bootstrap).count() == 4);
    assert_eq!(result.resources.len(), 14);
    assert!(result
        .resources
        .iter()
        .all(|r| (0.0..=1.0).contains(&r.utilisation)));

    let scanned = result
        .specimens
        .iter()
        .find(|s| s.priority == Priority::Urgent)
        .unwrap();
    assert!(scanned.completed);
    // Minimum-turnaround estimate: synthesised history plus scanning and QC.
    assert_eq!(scanned.turnaround(), Some(25.0));
}

#[test]
fn test_invalid_config_rejected_before_running() {
    let mut config = unit_config();
    config.num_reps = 0;
    let progress = Arc::new(Progress::new());
    let err = run_replications(Arc::new(config), Arc::clone(&progress)).unwrap_err();

    assert!(matches!(err, SimulationError::Config(ConfigError::NoReplications)));
    assert_eq!(progress.replications_done(), 0);
}

#[test]
fn test_sampling_failure_reports_first_replication() {
    let mut config = unit_config();
    config.num_reps = 3;
    config.task_durations.insert(
        Task::ReceiveAndSort,
        Distribution::Normal {
            mean: -1.0,
            std_dev: 0.0,
        },
    );
    config.wip = vec![wip(Stage::Reception, Priority::Routine, Source::Internal, 1)];

    let err = run_replications(Arc::new(config), Arc::new(Progress::new())).unwrap_err();
    match err {
        SimulationError::Replication { replication, source } => {
            assert_eq!(replication, 0);
            assert!(matches!(
                *source,
                SimulationError::Sampling(SamplingError::InvalidDuration { ref what, value })
                    if what == "receive_and_sort" && value == -1.0
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}
