//! Scenario configuration
//!
//! A [`Config`] is the structured form of one submitted scenario: horizon,
//! replications, resource capacities, branching tables, duration and count
//! distributions, arrival streams and the work-in-progress snapshot used for
//! the warm start.
//!
//! Configurations are validated as a whole by [`Config::validate`] before any
//! replication starts. Everything that can go wrong because of the
//! configuration (other than a distribution drawing a negative value) is
//! reported here, never mid-run.

pub mod distribution;
pub mod tables;

pub use distribution::{Distribution, SamplingError};
pub use tables::{BranchProbabilities, CountDistributions, Globals, Task, TaskDurations};

use crate::arrivals::ArrivalStream;
use crate::bootstrap::WipEntry;
use crate::pipeline::{Pipeline, Requirements};
use crate::resources::Resource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use thiserror::Error;

/// Slack allowed when checking that a threshold chain sums to at most 1.
const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Configuration errors, all detected before a run starts
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Simulation horizon must be positive and finite, got {0}")]
    InvalidHorizon(f64),

    #[error("Number of replications must be at least 1")]
    NoReplications,

    #[error("Resource {0} has zero capacity")]
    ZeroCapacity(Resource),

    #[error("Resource {0} is needed by a reachable stage but has no capacity configured")]
    MissingCapacity(Resource),

    #[error("Probability {name} = {value} is outside [0, 1]")]
    InvalidProbability { name: String, value: f64 },

    #[error("Probabilities {names} sum to {sum}, which exceeds 1")]
    ProbabilitySumExceedsOne { names: String, sum: f64 },

    #[error("No duration distribution for reachable task {0}")]
    MissingDuration(Task),

    #[error("Invalid distribution for {name}: {reason}")]
    InvalidDistribution { name: String, reason: String },

    #[error("Invalid arrival stream {index}: {reason}")]
    InvalidArrivalStream { index: usize, reason: String },
}

fn default_num_reps() -> usize {
    1
}

/// One scenario's full parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Horizon of each replication, in hours
    pub sim_hours: f64,

    /// Number of independent replications
    #[serde(default = "default_num_reps")]
    pub num_reps: usize,

    /// Master seed; replication seeds are derived from it
    #[serde(default)]
    pub seed: u64,

    /// Capacity per resource
    pub resources: BTreeMap<Resource, u32>,

    /// Branching probabilities and child-count distributions
    pub globals: Globals,

    /// Duration distribution per task, transits included
    pub task_durations: TaskDurations,

    /// Fresh-arrival streams
    #[serde(default)]
    pub arrivals: Vec<ArrivalStream>,

    /// Specimens already in progress at time zero
    #[serde(default)]
    pub wip: Vec<WipEntry>,
}

impl Config {
    /// Parse a JSON configuration (no validation).
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse a JSON configuration from a reader (no validation).
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        serde_json::from_reader(reader).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the whole configuration.
    ///
    /// Checks, in order: horizon and replications, capacities, probability
    /// tables, distribution parameters, arrival streams, then that every task
    /// and resource reachable under the probability tables is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sim_hours.is_finite() || self.sim_hours <= 0.0 {
            return Err(ConfigError::InvalidHorizon(self.sim_hours));
        }
        if self.num_reps == 0 {
            return Err(ConfigError::NoReplications);
        }

        if let Some((&resource, _)) = self.resources.iter().find(|(_, &cap)| cap == 0) {
            return Err(ConfigError::ZeroCapacity(resource));
        }

        for (_, table) in self.globals.tables() {
            validate_probabilities(table)?;
        }

        for (name, distribution) in self.globals.counts.entries() {
            check_distribution(name, distribution)?;
        }
        for (task, distribution) in self.task_durations.iter() {
            check_distribution(task.name(), distribution)?;
        }

        for (index, stream) in self.arrivals.iter().enumerate() {
            stream
                .check()
                .map_err(|reason| ConfigError::InvalidArrivalStream { index, reason })?;
        }

        let requirements = self.requirements();
        if let Some(&task) = requirements
            .tasks
            .iter()
            .find(|&&task| self.task_durations.get(task).is_none())
        {
            return Err(ConfigError::MissingDuration(task));
        }
        if let Some(&resource) = requirements
            .resources
            .iter()
            .find(|&&resource| !self.resources.contains_key(&resource))
        {
            return Err(ConfigError::MissingCapacity(resource));
        }

        Ok(())
    }

    /// Tasks and resources reachable under this configuration's tables.
    pub fn requirements(&self) -> Requirements {
        Pipeline::standard().requirements(&self.globals)
    }
}

fn validate_probabilities(table: &BranchProbabilities) -> Result<(), ConfigError> {
    for (name, value) in table.entries() {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidProbability {
                name: name.to_string(),
                value,
            });
        }
    }
    for (names, sum) in table.chains() {
        if sum > 1.0 + PROBABILITY_TOLERANCE {
            return Err(ConfigError::ProbabilitySumExceedsOne {
                names: names.to_string(),
                sum,
            });
        }
    }
    Ok(())
}

fn check_distribution(name: &str, distribution: &Distribution) -> Result<(), ConfigError> {
    distribution
        .check()
        .map_err(|reason| ConfigError::InvalidDistribution {
            name: name.to_string(),
            reason,
        })
}
