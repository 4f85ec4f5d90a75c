//! Histopathology Lab Simulator Core
//!
//! Discrete-event simulation of specimens flowing through a histopathology
//! laboratory, with deterministic execution per seed.
//!
//! # Architecture
//!
//! - **core**: Logical clock and event queue
//! - **rng**: Deterministic random number generation
//! - **config**: Scenario configuration, distributions and validation
//! - **models**: Domain types (Specimen, Block, Slide, Stage, Event)
//! - **resources**: Priority-aware resource pools
//! - **pipeline**: The eight stage handlers and the simulation context
//! - **bootstrap**: Warm start from a work-in-progress snapshot
//! - **arrivals**: Renewal-process arrival streams
//! - **orchestrator**: Event loop, results and the parallel replication runner
//!
//! # Critical Invariants
//!
//! 1. All randomness flows through one seeded source per replication
//! 2. Pool occupancy never exceeds capacity
//! 3. A specimen's blocks and slides are produced once and never re-derived

// Module declarations
pub mod arrivals;
pub mod bootstrap;
pub mod config;
pub mod core;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod resources;
pub mod rng;

// Re-exports for convenience
pub use arrivals::{ArrivalGenerator, ArrivalStream};
pub use bootstrap::{warm_start, BootstrapRecord, WipEntry};
pub use config::{Config, ConfigError, Distribution, Globals, SamplingError, Task};
pub use crate::core::time::{Clock, ClockError, SimTime};
pub use models::{
    event::{Event, EventLog},
    Priority, Source, Specimen, SpecimenId, Stage,
};
pub use orchestrator::{
    run_replications, Model, Progress, ReplicationResult, RunSummary, SimulationError,
    SpecimenRecord,
};
pub use pipeline::{Pipeline, SimContext, StageHandler};
pub use resources::{Resource, ResourceError, ResourcePool, ResourcePools};
pub use rng::RandomSource;
