//! Orchestrator Engine
//!
//! One [`Model`] runs one replication. It owns the [`Clock`], the
//! replication's [`SimContext`], the [`ResourcePools`], the stage
//! [`Pipeline`] and every specimen created during the run.
//!
//! # Architecture
//!
//! Specimens never block. Every point where a specimen would wait becomes
//! an explicit continuation event on the clock:
//!
//! ```text
//! Arrival(stream)      create specimen, enter Reception, schedule next arrival
//! Enter(specimen, s)   record start, plan stage s, start the first step
//! Resume(specimen)     a release handed this specimen the unit it queued for
//! StepDone(specimen)   release the step's resources, start the next step
//!                      or finish the stage (apply outcome, schedule transit)
//! ```
//!
//! A step acquires its resources one by one in canonical order, holds them
//! all for the step's sampled duration, then releases them. A release that
//! hands a unit to a waiter schedules that waiter's `Resume` at delay 0, so
//! it continues at the current instant before the clock moves on.
//!
//! # Example
//!
//! ```rust,ignore
//! use hpath_sim_core::{Config, Model};
//! use std::sync::Arc;
//!
//! let config = Config::from_json_str(&std::fs::read_to_string("scenario.json")?)?;
//! let mut model = Model::new(Arc::new(config), 42)?;
//! let summary = model.run()?;
//! println!("{} of {} specimens completed", summary.completed, summary.specimens);
//! ```

use crate::arrivals::ArrivalGenerator;
use crate::bootstrap::warm_start;
use crate::config::{Config, ConfigError, SamplingError};
use crate::core::{Clock, ClockError, SimTime};
use crate::models::{
    Event, EventLog, ModelError, Position, Priority, Source, Specimen, SpecimenId, Stage,
};
use crate::orchestrator::replication::Progress;
use crate::orchestrator::results::{ReplicationResult, ResourceSummary, SpecimenRecord};
use crate::pipeline::{Pipeline, SimContext, StagePlan, Work};
use crate::resources::{Acquire, Resource, ResourceError, ResourcePools};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

// ============================================================================
// Errors
// ============================================================================

/// Simulation errors
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sampling(#[from] SamplingError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    Model(#[from] ModelError),

    /// A stage that consumes children was reached before they were produced
    #[error("Specimen {specimen} reached {stage} without {kind}")]
    MissingChildren {
        specimen: String,
        stage: Stage,
        kind: &'static str,
    },

    #[error("Specimen {0} is unknown or has no pending activity")]
    UnknownSpecimen(SpecimenId),

    #[error("Replication {replication} failed: {source}")]
    Replication {
        replication: usize,
        #[source]
        source: Box<SimulationError>,
    },
}

// ============================================================================
// Engine events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum EngineEvent {
    Arrival { stream: usize },
    Enter { specimen: SpecimenId, stage: Stage },
    Resume(SpecimenId),
    StepDone(SpecimenId),
}

/// A specimen's progress through its current stage.
#[derive(Debug)]
struct Activity {
    plan: StagePlan,
    step: usize,
    acquired: usize,
    /// Resource this specimen is queued for
    waiting: Option<Resource>,
}

enum NextAction {
    Acquire(Resource),
    Hold(Vec<Work>),
    FinishStage,
}

/// Outcome of [`Model::run`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    pub end_time: SimTime,
    pub specimens: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub bootstrap: usize,
    pub events: usize,
}

// ============================================================================
// Model
// ============================================================================

/// One replication of the lab.
pub struct Model {
    ctx: SimContext,
    seed: u64,
    replication: usize,
    clock: Clock<EngineEvent>,
    pools: ResourcePools,
    pipeline: Pipeline,
    arrivals: ArrivalGenerator,
    specimens: Vec<Specimen>,
    activities: Vec<Option<Activity>>,
    log: EventLog,
    completed: usize,
    progress: Option<Arc<Progress>>,
}

impl Model {
    /// Build a replication from a configuration and its seed.
    ///
    /// Validates the configuration, creates the pools, warm-starts every
    /// work-in-progress specimen (in entry order, all entering at t=0) and
    /// schedules the first arrival of each active stream.
    pub fn new(config: Arc<Config>, seed: u64) -> Result<Self, SimulationError> {
        config.validate()?;

        let pools = ResourcePools::new(&config.resources)?;
        let arrivals = ArrivalGenerator::new(config.arrivals.clone());
        let wip = config.wip.clone();

        let mut model = Self {
            ctx: SimContext::new(config, seed),
            seed,
            replication: 0,
            clock: Clock::new(),
            pools,
            pipeline: Pipeline::standard(),
            arrivals,
            specimens: Vec::new(),
            activities: Vec::new(),
            log: EventLog::new(),
            completed: 0,
            progress: None,
        };

        for entry in &wip {
            for _ in 0..entry.count {
                model.bootstrap_specimen(entry.stage, entry.priority, entry.source)?;
            }
        }

        for (stream, delay) in model.arrivals.first_arrivals(model.ctx.random_mut()) {
            model.clock.schedule(delay, EngineEvent::Arrival { stream })?;
        }

        Ok(model)
    }

    /// Attach a shared progress counter.
    pub fn with_progress(mut self, progress: Arc<Progress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Set the replication index reported in results.
    pub fn with_replication(mut self, replication: usize) -> Self {
        self.replication = replication;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &Config {
        self.ctx.config()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn specimens(&self) -> &[Specimen] {
        &self.specimens
    }

    pub fn specimen(&self, id: SpecimenId) -> Option<&Specimen> {
        self.specimens.get(id.0)
    }

    pub fn completed(&self) -> impl Iterator<Item = &Specimen> {
        self.specimens.iter().filter(|s| s.is_finished())
    }

    pub fn incomplete(&self) -> impl Iterator<Item = &Specimen> {
        self.specimens.iter().filter(|s| !s.is_finished())
    }

    pub fn completed_count(&self) -> usize {
        self.completed
    }

    pub fn pools(&self) -> &ResourcePools {
        &self.pools
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    /// Events still waiting on the clock.
    pub fn pending_events(&self) -> usize {
        self.clock.len()
    }

    // ========================================================================
    // Driving the run
    // ========================================================================

    /// Inject a fresh specimen at Reception at the current time.
    pub fn submit(
        &mut self,
        priority: Priority,
        source: Source,
    ) -> Result<SpecimenId, SimulationError> {
        let id = self.spawn(priority, source, false);
        self.clock.schedule(
            0.0,
            EngineEvent::Enter {
                specimen: id,
                stage: Stage::Reception,
            },
        )?;
        Ok(id)
    }

    /// Dispatch events until the clock passes the horizon.
    pub fn run(&mut self) -> Result<RunSummary, SimulationError> {
        let horizon = self.config().sim_hours;
        info!(
            replication = self.replication,
            seed = self.seed,
            wip = self.specimens.len(),
            horizon,
            "replication started"
        );

        while let Some((now, event)) = self.clock.pop_until(horizon) {
            self.dispatch(now, event)?;
            debug_assert!(
                self.pools.iter().all(|p| p.occupancy() <= p.capacity()),
                "pool over capacity at t={}",
                now
            );
        }
        self.clock.advance_to(horizon);
        self.pools.settle(horizon);

        let summary = self.summary();
        if summary.in_progress > 0 {
            warn!(
                replication = self.replication,
                in_progress = summary.in_progress,
                "specimens still in progress at the horizon"
            );
        }
        info!(
            replication = self.replication,
            specimens = summary.specimens,
            completed = summary.completed,
            events = summary.events,
            "replication finished"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            end_time: self.clock.now(),
            specimens: self.specimens.len(),
            completed: self.completed,
            in_progress: self.specimens.len() - self.completed,
            bootstrap: self.specimens.iter().filter(|s| s.is_bootstrap()).count(),
            events: self.log.len(),
        }
    }

    /// Collect the replication's records for reporting.
    pub fn results(&self) -> ReplicationResult {
        let horizon = self.clock.now();
        ReplicationResult {
            replication: self.replication,
            seed: self.seed,
            end_time: horizon,
            completed: self.completed,
            specimens: self.specimens.iter().map(SpecimenRecord::from).collect(),
            resources: self
                .pools
                .iter()
                .map(|pool| ResourceSummary::from_pool(pool, horizon))
                .collect(),
        }
    }

    // ========================================================================
    // Event handlers
    // ========================================================================

    fn dispatch(&mut self, now: SimTime, event: EngineEvent) -> Result<(), SimulationError> {
        match event {
            EngineEvent::Arrival { stream } => self.on_arrival(now, stream),
            EngineEvent::Enter { specimen, stage } => self.enter(now, specimen, stage),
            EngineEvent::Resume(specimen) => self.on_resume(now, specimen),
            EngineEvent::StepDone(specimen) => self.on_step_done(now, specimen),
        }
    }

    fn on_arrival(&mut self, now: SimTime, stream: usize) -> Result<(), SimulationError> {
        let Some((source, priority, gap)) = self.arrivals.arrive(stream, self.ctx.random_mut())
        else {
            return Ok(());
        };
        let id = self.spawn(priority, source, false);
        self.enter(now, id, Stage::Reception)?;
        self.clock.schedule(gap, EngineEvent::Arrival { stream })?;
        Ok(())
    }

    fn enter(&mut self, now: SimTime, id: SpecimenId, stage: Stage) -> Result<(), SimulationError> {
        let specimen = self
            .specimens
            .get_mut(id.0)
            .ok_or(SimulationError::UnknownSpecimen(id))?;
        specimen.set_position(Position::InStage(stage));
        specimen.record_start(stage, now);
        self.log.log(Event::StageEntered {
            time: now,
            specimen: id,
            stage,
        });

        let plan = self.pipeline.plan(&mut self.ctx, &self.specimens[id.0], stage)?;
        self.activities[id.0] = Some(Activity {
            plan,
            step: 0,
            acquired: 0,
            waiting: None,
        });
        self.advance(now, id)
    }

    fn on_resume(&mut self, now: SimTime, id: SpecimenId) -> Result<(), SimulationError> {
        let activity = self.activity_mut(id)?;
        let resource = activity
            .waiting
            .take()
            .ok_or(SimulationError::UnknownSpecimen(id))?;
        activity.acquired += 1;

        trace!(specimen = %id, %resource, time = now, "granted after wait");
        self.log.log(Event::ResourceGranted {
            time: now,
            specimen: id,
            resource,
        });
        self.advance(now, id)
    }

    fn on_step_done(&mut self, now: SimTime, id: SpecimenId) -> Result<(), SimulationError> {
        let resources = {
            let activity = self.activity_mut(id)?;
            let resources = activity
                .plan
                .steps
                .get(activity.step)
                .map(|step| step.resources().to_vec())
                .unwrap_or_default();
            activity.step += 1;
            activity.acquired = 0;
            resources
        };

        for resource in resources {
            let granted_to = self.pools.release(resource, now)?;
            self.log.log(Event::ResourceReleased {
                time: now,
                specimen: id,
                resource,
                granted_to,
            });
            if let Some(waiter) = granted_to {
                trace!(from = %id, to = %waiter, %resource, time = now, "unit handed over");
                self.clock.schedule(0.0, EngineEvent::Resume(waiter))?;
            }
        }

        self.advance(now, id)
    }

    // ========================================================================
    // Stage mechanics
    // ========================================================================

    /// Acquire, hold or finish, until the specimen has to wait.
    fn advance(&mut self, now: SimTime, id: SpecimenId) -> Result<(), SimulationError> {
        loop {
            match self.next_action(id)? {
                NextAction::Acquire(resource) => {
                    if !self.request(now, id, resource)? {
                        return Ok(());
                    }
                }
                NextAction::Hold(work) => {
                    let duration = self.ctx.work(&work)?;
                    self.clock.schedule(duration, EngineEvent::StepDone(id))?;
                    return Ok(());
                }
                NextAction::FinishStage => return self.finish_stage(now, id),
            }
        }
    }

    fn next_action(&self, id: SpecimenId) -> Result<NextAction, SimulationError> {
        let activity = self
            .activities
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(SimulationError::UnknownSpecimen(id))?;
        let Some(step) = activity.plan.steps.get(activity.step) else {
            return Ok(NextAction::FinishStage);
        };
        Ok(match step.resources().get(activity.acquired) {
            Some(&resource) => NextAction::Acquire(resource),
            None => NextAction::Hold(step.work().to_vec()),
        })
    }

    /// Request one unit; returns whether it was granted on the spot.
    fn request(
        &mut self,
        now: SimTime,
        id: SpecimenId,
        resource: Resource,
    ) -> Result<bool, SimulationError> {
        let priority = self
            .specimen(id)
            .map(Specimen::priority)
            .ok_or(SimulationError::UnknownSpecimen(id))?;
        let outcome = self.pools.acquire(resource, id, priority, now)?;
        let occupancy = self.pools.get(resource).map_or(0, |p| p.occupancy());
        self.log.log(Event::ResourceRequested {
            time: now,
            specimen: id,
            resource,
            queued: outcome == Acquire::Queued,
            occupancy,
        });

        let activity = self.activity_mut(id)?;
        match outcome {
            Acquire::Granted => {
                activity.acquired += 1;
                self.log.log(Event::ResourceGranted {
                    time: now,
                    specimen: id,
                    resource,
                });
                Ok(true)
            }
            Acquire::Queued => {
                activity.waiting = Some(resource);
                trace!(specimen = %id, %resource, ?priority, time = now, "queued");
                Ok(false)
            }
        }
    }

    fn finish_stage(&mut self, now: SimTime, id: SpecimenId) -> Result<(), SimulationError> {
        let activity = self
            .activities
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(SimulationError::UnknownSpecimen(id))?;
        let stage = activity.plan.stage;

        let specimen = self
            .specimens
            .get_mut(id.0)
            .ok_or(SimulationError::UnknownSpecimen(id))?;
        specimen.record_end(stage, now);
        activity.plan.outcome.apply(specimen)?;

        let next = match (activity.plan.transit, stage.next()) {
            (Some(task), Some(next)) => Some((self.ctx.duration(task)?, next)),
            _ => None,
        };

        let specimen = &mut self.specimens[id.0];
        match next {
            Some((transit, next)) => {
                specimen.record_transit(stage, transit);
                specimen.set_position(Position::InTransit(stage));
                debug!(specimen = specimen.name(), %stage, time = now, transit, "stage completed");
                self.log.log(Event::StageCompleted {
                    time: now,
                    specimen: id,
                    stage,
                    transit: Some(transit),
                });
                self.clock.schedule(
                    transit,
                    EngineEvent::Enter {
                        specimen: id,
                        stage: next,
                    },
                )?;
            }
            None => {
                specimen.set_position(Position::Finished);
                debug!(specimen = specimen.name(), time = now, "specimen completed");
                self.log.log(Event::StageCompleted {
                    time: now,
                    specimen: id,
                    stage,
                    transit: None,
                });
                self.log.log(Event::SpecimenCompleted {
                    time: now,
                    specimen: id,
                });
                self.completed += 1;
                if let Some(progress) = &self.progress {
                    progress.specimen_completed();
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Specimen creation
    // ========================================================================

    fn spawn(&mut self, priority: Priority, source: Source, bootstrap: bool) -> SpecimenId {
        let id = SpecimenId(self.specimens.len());
        let name = format!("S{:06}", id.0 + 1);
        let mut specimen = Specimen::new(id, name, priority, source);
        if bootstrap {
            specimen = specimen.into_bootstrap();
        }
        self.specimens.push(specimen);
        self.activities.push(None);
        self.log.log(Event::Arrival {
            time: self.clock.now(),
            specimen: id,
            priority,
            source,
            bootstrap,
        });
        id
    }

    fn bootstrap_specimen(
        &mut self,
        stage: Stage,
        priority: Priority,
        source: Source,
    ) -> Result<SpecimenId, SimulationError> {
        let id = self.spawn(priority, source, true);
        let specimen = &mut self.specimens[id.0];
        warm_start(&mut self.ctx, &self.pipeline, specimen, stage)?;
        specimen.set_position(Position::Awaiting(stage));
        self.clock
            .schedule(0.0, EngineEvent::Enter { specimen: id, stage })?;
        Ok(id)
    }

    fn activity_mut(&mut self, id: SpecimenId) -> Result<&mut Activity, SimulationError> {
        self.activities
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(SimulationError::UnknownSpecimen(id))
    }
}
