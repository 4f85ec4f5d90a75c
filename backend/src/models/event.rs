//! Event logging for auditing and tests.
//!
//! Every arrival, resource request, grant and release, and every stage
//! boundary is recorded in an [`EventLog`], in dispatch order. The log is
//! a trace, not a source of truth: the specimens' own timestamps are what
//! gets reported.
//!
//! # Example
//!
//! ```rust
//! use hpath_sim_core::models::{Event, EventLog, SpecimenId, Stage};
//!
//! let mut log = EventLog::new();
//! log.log(Event::StageEntered {
//!     time: 1.5,
//!     specimen: SpecimenId(0),
//!     stage: Stage::Cutup,
//! });
//!
//! assert_eq!(log.events_for_specimen(SpecimenId(0)).len(), 1);
//! assert_eq!(log.events()[0].time(), 1.5);
//! ```

use super::{Priority, Source, SpecimenId, Stage};
use crate::core::SimTime;
use crate::resources::Resource;
use serde::Serialize;

/// Simulation event capturing a state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Specimen created, either by an arrival stream, `submit` or warm start
    Arrival {
        time: SimTime,
        specimen: SpecimenId,
        priority: Priority,
        source: Source,
        bootstrap: bool,
    },

    StageEntered {
        time: SimTime,
        specimen: SpecimenId,
        stage: Stage,
    },

    /// `queued` is false when the unit was granted on the spot
    ResourceRequested {
        time: SimTime,
        specimen: SpecimenId,
        resource: Resource,
        queued: bool,
        occupancy: u32,
    },

    ResourceGranted {
        time: SimTime,
        specimen: SpecimenId,
        resource: Resource,
    },

    ResourceReleased {
        time: SimTime,
        specimen: SpecimenId,
        resource: Resource,
        /// Waiter the freed unit was handed to, if any
        granted_to: Option<SpecimenId>,
    },

    StageCompleted {
        time: SimTime,
        specimen: SpecimenId,
        stage: Stage,
        transit: Option<SimTime>,
    },

    SpecimenCompleted {
        time: SimTime,
        specimen: SpecimenId,
    },
}

impl Event {
    pub fn time(&self) -> SimTime {
        match self {
            Event::Arrival { time, .. }
            | Event::StageEntered { time, .. }
            | Event::ResourceRequested { time, .. }
            | Event::ResourceGranted { time, .. }
            | Event::ResourceReleased { time, .. }
            | Event::StageCompleted { time, .. }
            | Event::SpecimenCompleted { time, .. } => *time,
        }
    }

    /// Short name of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Arrival { .. } => "Arrival",
            Event::StageEntered { .. } => "StageEntered",
            Event::ResourceRequested { .. } => "ResourceRequested",
            Event::ResourceGranted { .. } => "ResourceGranted",
            Event::ResourceReleased { .. } => "ResourceReleased",
            Event::StageCompleted { .. } => "StageCompleted",
            Event::SpecimenCompleted { .. } => "SpecimenCompleted",
        }
    }

    pub fn specimen(&self) -> SpecimenId {
        match self {
            Event::Arrival { specimen, .. }
            | Event::StageEntered { specimen, .. }
            | Event::ResourceRequested { specimen, .. }
            | Event::ResourceGranted { specimen, .. }
            | Event::ResourceReleased { specimen, .. }
            | Event::StageCompleted { specimen, .. }
            | Event::SpecimenCompleted { specimen, .. } => *specimen,
        }
    }

    pub fn resource(&self) -> Option<Resource> {
        match self {
            Event::ResourceRequested { resource, .. }
            | Event::ResourceGranted { resource, .. }
            | Event::ResourceReleased { resource, .. } => Some(*resource),
            _ => None,
        }
    }
}

/// Append-only event log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_specimen(&self, specimen: SpecimenId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.specimen() == specimen)
            .collect()
    }

    pub fn events_for_resource(&self, resource: Resource) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.resource() == Some(resource))
            .collect()
    }
}
