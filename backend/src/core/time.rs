//! Logical clock and pending-event queue
//!
//! The simulation advances in continuous time (hours, as `f64`). The
//! [`Clock`] holds every pending continuation ordered by `(time, seq)`,
//! where `seq` is a monotonically increasing insertion counter. Events at
//! the same instant therefore resume in the order they were scheduled,
//! which keeps a replication deterministic for a fixed seed.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use thiserror::Error;

/// Simulation time in hours.
pub type SimTime = f64;

/// Errors raised when scheduling on the clock
#[derive(Debug, Error, PartialEq)]
pub enum ClockError {
    #[error("Delay must be finite and non-negative, got {0}")]
    InvalidDelay(f64),
}

/// A pending continuation.
#[derive(Debug)]
struct Scheduled<E> {
    time: SimTime,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Scheduled<E> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<E> Eq for Scheduled<E> {}

impl<E> PartialOrd for Scheduled<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Scheduled<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Time-ordered event queue driving one replication.
///
/// # Example
/// ```
/// use hpath_sim_core::Clock;
///
/// let mut clock = Clock::new();
/// clock.schedule(2.0, "second").unwrap();
/// clock.schedule(1.0, "first").unwrap();
///
/// assert_eq!(clock.pop_until(10.0), Some((1.0, "first")));
/// assert_eq!(clock.now(), 1.0);
/// assert_eq!(clock.pop_until(1.5), None); // next event lies past the horizon
/// ```
#[derive(Debug)]
pub struct Clock<E> {
    now: SimTime,
    next_seq: u64,
    queue: BinaryHeap<Reverse<Scheduled<E>>>,
}

impl<E> Default for Clock<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clock<E> {
    /// Create a clock at time zero with no pending events.
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Current simulation time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Time of the earliest pending event, if any.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|Reverse(s)| s.time)
    }

    /// Register `event` to fire at `now + delay`.
    ///
    /// Returns the sequence number assigned to the event.
    pub fn schedule(&mut self, delay: SimTime, event: E) -> Result<u64, ClockError> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(ClockError::InvalidDelay(delay));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled {
            time: self.now + delay,
            seq,
            event,
        }));
        Ok(seq)
    }

    /// Pop the earliest event if it fires no later than `horizon`.
    ///
    /// On success the clock advances to the event's time. An event past the
    /// horizon is left in the queue and `None` is returned.
    pub fn pop_until(&mut self, horizon: SimTime) -> Option<(SimTime, E)> {
        match self.peek_time() {
            Some(time) if time <= horizon => {}
            _ => return None,
        }
        let Reverse(scheduled) = self.queue.pop()?;
        self.now = scheduled.time;
        Some((scheduled.time, scheduled.event))
    }

    /// Move the clock forward to `time` without firing anything.
    ///
    /// Used to close a run at its horizon; never moves time backwards.
    pub fn advance_to(&mut self, time: SimTime) {
        if time > self.now {
            self.now = time;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_delay_rejected() {
        let mut clock: Clock<()> = Clock::new();
        assert_eq!(clock.schedule(-1.0, ()), Err(ClockError::InvalidDelay(-1.0)));
        assert!(clock.schedule(f64::NAN, ()).is_err());
        assert!(clock.is_empty());
    }

    #[test]
    fn test_equal_times_are_fifo() {
        let mut clock = Clock::new();
        for i in 0..5 {
            clock.schedule(3.0, i).unwrap();
        }
        let order: Vec<i32> =
            std::iter::from_fn(|| clock.pop_until(10.0).map(|(_, e)| e)).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_horizon_leaves_event_queued() {
        let mut clock = Clock::new();
        clock.schedule(5.0, 'a').unwrap();
        assert_eq!(clock.pop_until(4.0), None);
        assert_eq!(clock.len(), 1);
        assert_eq!(clock.now(), 0.0);
    }
}
