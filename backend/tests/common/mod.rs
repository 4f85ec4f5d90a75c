//! Shared scenario builders for the integration tests.

#![allow(dead_code)]

use hpath_sim_core::arrivals::ArrivalStream;
use hpath_sim_core::bootstrap::WipEntry;
use hpath_sim_core::config::{BranchProbabilities, CountDistributions, Globals};
use hpath_sim_core::models::{Priority, Source, Stage};
use hpath_sim_core::{Config, Distribution, Resource, Task};

/// Every branch pinned: BMS cut-up, no decalc, levels, no investigations.
pub fn pinned_probabilities() -> BranchProbabilities {
    BranchProbabilities {
        prob_prebook: 0.0,
        prob_invest_easy: 0.0,
        prob_invest_hard: 0.0,
        prob_invest_external: 0.0,
        prob_bms_cutup: 1.0,
        prob_pool_cutup: 0.0,
        prob_mega_blocks: 0.0,
        prob_decalc_bone: 0.0,
        prob_decalc_oven: 0.0,
        prob_microtomy_levels: 1.0,
    }
}

pub fn unit_counts() -> CountDistributions {
    CountDistributions {
        num_blocks_large_surgical: Distribution::constant(1.0),
        num_blocks_mega: Distribution::constant(1.0),
        num_slides_larges: Distribution::constant(1.0),
        num_slides_levels: Distribution::constant(1.0),
        num_slides_megas: Distribution::constant(1.0),
        num_slides_serials: Distribution::constant(1.0),
    }
}

/// Capacity 1 everywhere, every task takes exactly one hour.
///
/// A single specimen through this lab takes 25 hours: 18 hours of steps
/// plus 7 one-hour transits (QC has none, staining has two steps).
pub fn unit_config() -> Config {
    Config {
        sim_hours: 100.0,
        num_reps: 1,
        seed: 42,
        resources: Resource::ALL.iter().map(|&r| (r, 1)).collect(),
        globals: Globals {
            probabilities: pinned_probabilities(),
            urgent: None,
            counts: unit_counts(),
        },
        task_durations: Task::ALL
            .iter()
            .map(|&t| (t, Distribution::constant(1.0)))
            .collect(),
        arrivals: Vec::new(),
        wip: Vec::new(),
    }
}

/// Every branch live, random durations and counts, two arrival streams.
pub fn stochastic_config() -> Config {
    let mut config = unit_config();
    config.sim_hours = 120.0;
    config.seed = 7;
    config.resources = Resource::ALL.iter().map(|&r| (r, 2)).collect();
    config.globals.probabilities = BranchProbabilities {
        prob_prebook: 0.2,
        prob_invest_easy: 0.3,
        prob_invest_hard: 0.1,
        prob_invest_external: 0.4,
        prob_bms_cutup: 0.4,
        prob_pool_cutup: 0.3,
        prob_mega_blocks: 0.3,
        prob_decalc_bone: 0.1,
        prob_decalc_oven: 0.1,
        prob_microtomy_levels: 0.6,
    };
    config.globals.urgent = Some(BranchProbabilities {
        prob_prebook: 0.0,
        prob_bms_cutup: 0.2,
        prob_pool_cutup: 0.2,
        ..config.globals.probabilities
    });
    config.globals.counts = CountDistributions {
        num_blocks_large_surgical: Distribution::Uniform { low: 1.0, high: 4.0 },
        num_blocks_mega: Distribution::Triangular {
            low: 1.0,
            mode: 2.0,
            high: 3.0,
        },
        num_slides_larges: Distribution::constant(2.0),
        num_slides_levels: Distribution::Uniform { low: 1.0, high: 3.0 },
        num_slides_megas: Distribution::constant(1.0),
        num_slides_serials: Distribution::Pert {
            low: 2.0,
            mode: 4.0,
            high: 8.0,
        },
    };
    config.task_durations = Task::ALL
        .iter()
        .map(|&t| {
            let d = match t {
                Task::ProcessingUrgent
                | Task::ProcessingSmallSurgicals
                | Task::ProcessingLargeSurgicals
                | Task::ProcessingMegas => Distribution::Triangular {
                    low: 2.0,
                    mode: 4.0,
                    high: 6.0,
                },
                Task::Decalc => Distribution::Exponential { mean: 3.0 },
                _ => Distribution::Exponential { mean: 0.05 },
            };
            (t, d)
        })
        .collect();
    config.arrivals = vec![
        ArrivalStream {
            source: Source::Internal,
            rate_per_hour: 2.0,
            prob_urgent: 0.2,
        },
        ArrivalStream {
            source: Source::External,
            rate_per_hour: 0.5,
            prob_urgent: 0.1,
        },
    ];
    config.wip = vec![
        wip(Stage::Cutup, Priority::Routine, Source::Internal, 3),
        wip(Stage::Staining, Priority::Urgent, Source::External, 2),
        wip(Stage::Qc, Priority::Routine, Source::Internal, 1),
    ];
    config
}

pub fn wip(stage: Stage, priority: Priority, source: Source, count: usize) -> WipEntry {
    WipEntry {
        stage,
        priority,
        source,
        count,
    }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
