//! Deterministic random number generation
//!
//! Uses the xorshift64* algorithm. Every random draw in a replication
//! (branching thresholds, task durations, child counts, arrivals) MUST go
//! through the replication's [`RandomSource`], otherwise runs with the same
//! seed stop being reproducible.

mod xorshift;

pub use xorshift::RandomSource;
