//! Priority-aware counting lock
//!
//! A pool hands out up to `capacity` units. Requests that cannot be served
//! wait in a queue ordered by priority (urgent first), FIFO within the same
//! priority. A release hands the freed unit straight to the head of the
//! queue, so a unit is never idle while someone is waiting.

use super::Resource;
use crate::core::SimTime;
use crate::models::Priority;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use thiserror::Error;

/// Errors raised by resource pools
#[derive(Debug, Error, PartialEq)]
pub enum ResourceError {
    #[error("Resource {0} has zero capacity")]
    ZeroCapacity(Resource),

    #[error("Resource {0} released while no unit was held")]
    NotHeld(Resource),

    #[error("Resource {0} is not configured")]
    UnknownResource(Resource),
}

/// Outcome of an acquire request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// A unit was free and is now held by the caller.
    Granted,
    /// The caller waits; it will be handed a unit by a later release.
    Queued,
}

/// Running usage statistics of one pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceStats {
    /// Units handed out, immediately or from the queue
    pub grants: usize,
    /// Requests that had to wait
    pub queued: usize,
    /// Longest the wait queue ever got
    pub peak_queue_len: usize,
    /// Integral of occupancy over time (unit-hours)
    pub busy_time: f64,
}

#[derive(Debug, Clone)]
struct Waiter<W> {
    who: W,
    priority: Priority,
    seq: u64,
}

impl<W> PartialEq for Waiter<W> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<W> Eq for Waiter<W> {}

impl<W> PartialOrd for Waiter<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<W> Ord for Waiter<W> {
    // Max-heap: higher priority first, then the earliest request.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Capacity-bounded pool for one resource.
///
/// `W` identifies whoever is waiting (the engine uses specimen ids).
///
/// # Example
/// ```
/// use hpath_sim_core::models::Priority;
/// use hpath_sim_core::resources::{Acquire, Resource, ResourcePool};
///
/// let mut pool = ResourcePool::new(Resource::Scanner, 1).unwrap();
/// assert_eq!(pool.acquire("a", Priority::Routine, 0.0), Acquire::Granted);
/// assert_eq!(pool.acquire("b", Priority::Routine, 0.0), Acquire::Queued);
/// assert_eq!(pool.acquire("c", Priority::Urgent, 0.0), Acquire::Queued);
///
/// // Urgent request jumps the routine one.
/// assert_eq!(pool.release(1.0).unwrap(), Some("c"));
/// assert_eq!(pool.occupancy(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ResourcePool<W> {
    resource: Resource,
    capacity: u32,
    occupancy: u32,
    queue: BinaryHeap<Waiter<W>>,
    next_seq: u64,
    last_change: SimTime,
    stats: ResourceStats,
}

impl<W> ResourcePool<W> {
    pub fn new(resource: Resource, capacity: u32) -> Result<Self, ResourceError> {
        if capacity == 0 {
            return Err(ResourceError::ZeroCapacity(resource));
        }
        Ok(Self {
            resource,
            capacity,
            occupancy: 0,
            queue: BinaryHeap::new(),
            next_seq: 0,
            last_change: 0.0,
            stats: ResourceStats::default(),
        })
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn occupancy(&self) -> u32 {
        self.occupancy
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> &ResourceStats {
        &self.stats
    }

    /// Fraction of capacity in use, averaged over `[0, horizon]`.
    pub fn utilisation(&self, horizon: SimTime) -> f64 {
        if horizon <= 0.0 {
            return 0.0;
        }
        self.stats.busy_time / (self.capacity as f64 * horizon)
    }

    /// Request one unit.
    pub fn acquire(&mut self, who: W, priority: Priority, now: SimTime) -> Acquire {
        if self.occupancy < self.capacity {
            self.settle(now);
            self.occupancy += 1;
            self.stats.grants += 1;
            return Acquire::Granted;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Waiter { who, priority, seq });
        self.stats.queued += 1;
        self.stats.peak_queue_len = self.stats.peak_queue_len.max(self.queue.len());
        Acquire::Queued
    }

    /// Return one unit.
    ///
    /// If anyone is waiting, the unit passes directly to the head of the
    /// queue (occupancy unchanged) and that waiter is returned.
    pub fn release(&mut self, now: SimTime) -> Result<Option<W>, ResourceError> {
        if self.occupancy == 0 {
            return Err(ResourceError::NotHeld(self.resource));
        }
        match self.queue.pop() {
            Some(waiter) => {
                self.stats.grants += 1;
                Ok(Some(waiter.who))
            }
            None => {
                self.settle(now);
                self.occupancy -= 1;
                Ok(None)
            }
        }
    }

    /// Accumulate busy time up to `now`.
    pub fn settle(&mut self, now: SimTime) {
        if now > self.last_change {
            self.stats.busy_time += self.occupancy as f64 * (now - self.last_change);
            self.last_change = now;
        }
    }
}
