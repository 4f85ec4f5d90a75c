//! Arrival generation for fresh specimens.
//!
//! Each configured [`ArrivalStream`] is a renewal process: inter-arrival
//! times are exponential with mean `1 / rate_per_hour`, and the first
//! arrival happens one inter-arrival time after t=0. All draws go through
//! the replication's [`RandomSource`], so arrivals are reproducible.
//!
//! # Example
//!
//! ```
//! use hpath_sim_core::arrivals::{ArrivalGenerator, ArrivalStream};
//! use hpath_sim_core::models::Source;
//! use hpath_sim_core::rng::RandomSource;
//!
//! let stream = ArrivalStream {
//!     source: Source::Internal,
//!     rate_per_hour: 4.0,
//!     prob_urgent: 0.25,
//! };
//! assert!(stream.check().is_ok());
//!
//! let mut generator = ArrivalGenerator::new(vec![stream]);
//! let mut random = RandomSource::new(42);
//! let first = generator.first_arrivals(&mut random);
//! assert_eq!(first.len(), 1);
//! assert!(first[0].1 > 0.0);
//! ```

use crate::core::SimTime;
use crate::models::{Priority, Source};
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};

/// Configuration of one arrival stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalStream {
    pub source: Source,

    /// Expected arrivals per simulated hour; 0 disables the stream
    pub rate_per_hour: f64,

    /// Probability that an arriving specimen is urgent
    #[serde(default)]
    pub prob_urgent: f64,
}

impl ArrivalStream {
    pub fn check(&self) -> Result<(), String> {
        if !self.rate_per_hour.is_finite() || self.rate_per_hour < 0.0 {
            return Err(format!(
                "rate_per_hour must be finite and non-negative, got {}",
                self.rate_per_hour
            ));
        }
        if self.is_active() && !self.mean_gap().is_finite() {
            return Err(format!(
                "rate_per_hour {} is too small to give a finite inter-arrival time",
                self.rate_per_hour
            ));
        }
        if !(0.0..=1.0).contains(&self.prob_urgent) {
            return Err(format!(
                "prob_urgent must be in [0, 1], got {}",
                self.prob_urgent
            ));
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.rate_per_hour > 0.0
    }

    /// Mean time between arrivals, in hours.
    pub fn mean_gap(&self) -> f64 {
        1.0 / self.rate_per_hour
    }
}

/// Per-replication arrival state.
#[derive(Debug, Clone)]
pub struct ArrivalGenerator {
    streams: Vec<ArrivalStream>,
    generated: Vec<usize>,
}

impl ArrivalGenerator {
    pub fn new(streams: Vec<ArrivalStream>) -> Self {
        let generated = vec![0; streams.len()];
        Self { streams, generated }
    }

    pub fn streams(&self) -> &[ArrivalStream] {
        &self.streams
    }

    /// Specimens generated so far by stream `index`.
    pub fn generated(&self, index: usize) -> usize {
        self.generated.get(index).copied().unwrap_or(0)
    }

    /// Delay until the first arrival of every active stream, in stream order.
    pub fn first_arrivals(&self, random: &mut RandomSource) -> Vec<(usize, SimTime)> {
        self.streams
            .iter()
            .enumerate()
            .filter(|(_, stream)| stream.is_active())
            .map(|(index, stream)| (index, random.exponential(stream.mean_gap())))
            .collect()
    }

    /// Draw the arriving specimen's priority and the delay to the next
    /// arrival of the same stream.
    ///
    /// Returns `None` for an unknown or inactive stream.
    pub fn arrive(
        &mut self,
        index: usize,
        random: &mut RandomSource,
    ) -> Option<(Source, Priority, SimTime)> {
        let stream = self.streams.get(index).filter(|s| s.is_active())?;
        let priority = if random.u01() < stream.prob_urgent {
            Priority::Urgent
        } else {
            Priority::Routine
        };
        let gap = random.exponential(stream.mean_gap());
        self.generated[index] += 1;
        Some((stream.source, priority, gap))
    }
}
