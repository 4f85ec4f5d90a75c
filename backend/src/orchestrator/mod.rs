//! Orchestrator - event loop and replication runner
//!
//! See `engine.rs` for the per-replication event loop and `replication.rs`
//! for running replications in parallel.

pub mod engine;
pub mod replication;
pub mod results;

// Re-export main types for convenience
pub use engine::{Model, RunSummary, SimulationError};
pub use replication::{replication_seeds, run_replications, Progress};
pub use results::{ReplicationResult, ResourceSummary, SpecimenRecord};
