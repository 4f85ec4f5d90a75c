//! Simulation time and event scheduling

pub mod time;

pub use time::{Clock, ClockError, SimTime};
