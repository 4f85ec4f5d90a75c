//! Per-replication simulation context
//!
//! Bundles the read-only configuration with the replication's random
//! source. Every stage handler and the warm start draw through it, so the
//! order of draws (and therefore the whole run) is fixed by the seed.

use crate::config::{BranchProbabilities, Config, ConfigError, Task};
use crate::models::{BlockType, Priority, SlideType};
use crate::orchestrator::SimulationError;
use crate::rng::RandomSource;
use std::sync::Arc;

/// A unit of work inside a step: `task` performed `repeat` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Work {
    pub task: Task,
    pub repeat: usize,
}

impl Work {
    pub fn once(task: Task) -> Self {
        Self { task, repeat: 1 }
    }

    pub fn times(task: Task, repeat: usize) -> Self {
        Self { task, repeat }
    }
}

impl From<Task> for Work {
    fn from(task: Task) -> Self {
        Work::once(task)
    }
}

/// Configuration plus random source for one replication.
#[derive(Debug, Clone)]
pub struct SimContext {
    config: Arc<Config>,
    random: RandomSource,
}

impl SimContext {
    pub fn new(config: Arc<Config>, seed: u64) -> Self {
        Self {
            config,
            random: RandomSource::new(seed),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn random_mut(&mut self) -> &mut RandomSource {
        &mut self.random
    }

    /// Uniform variate for branching decisions.
    pub fn u01(&mut self) -> f64 {
        self.random.u01()
    }

    /// Threshold table for a specimen of `priority`.
    pub fn probabilities(&self, priority: Priority) -> BranchProbabilities {
        *self.config.globals.table(priority)
    }

    /// Sample one duration of `task`.
    pub fn duration(&mut self, task: Task) -> Result<f64, SimulationError> {
        let distribution = self
            .config
            .task_durations
            .get(task)
            .ok_or(ConfigError::MissingDuration(task))?;
        Ok(distribution.sample_duration(&mut self.random, || task.name().to_string())?)
    }

    /// Total duration of a list of work items, each repetition drawn separately.
    pub fn work(&mut self, work: &[Work]) -> Result<f64, SimulationError> {
        let mut total = 0.0;
        for item in work {
            for _ in 0..item.repeat {
                total += self.duration(item.task)?;
            }
        }
        Ok(total)
    }

    /// Number of blocks produced by a "large specimens" cut-up.
    pub fn block_count(&mut self, block_type: BlockType) -> Result<usize, SimulationError> {
        match self.config.globals.counts.blocks(block_type) {
            Some(distribution) => Ok(distribution
                .sample_count(&mut self.random, || format!("{:?} block count", block_type))?),
            None => Ok(1),
        }
    }

    /// Number of slides cut from one block.
    pub fn slide_count(&mut self, slide_type: SlideType) -> Result<usize, SimulationError> {
        let distribution = self.config.globals.counts.slides(slide_type);
        Ok(distribution.sample_count(&mut self.random, || format!("{:?} slide count", slide_type))?)
    }
}
