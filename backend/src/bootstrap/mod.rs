//! Warm start from a work-in-progress snapshot
//!
//! A real lab is never empty at t=0. Each [`WipEntry`] asks for `count`
//! specimens that are already waiting at some stage. For every such
//! specimen, [`warm_start`] replays the stages before its waiting stage with
//! zero queueing: the same stage plans (and therefore the same branch and
//! count distributions) are used, every step's duration is drawn and summed,
//! outcomes are applied so blocks and slides exist, and each transit is
//! drawn.
//!
//! The resulting [`BootstrapRecord`] is turned into timestamps by walking
//! backwards from t=0: the last completed stage's transit ends exactly at 0.
//!
//! Bootstrapped records are minimum-turnaround estimates. They carry the
//! `bootstrap` flag so reporting can leave them out of delay statistics.

use crate::core::SimTime;
use crate::models::{Priority, Source, Specimen, Stage, StageTimes};
use crate::orchestrator::SimulationError;
use crate::pipeline::{Pipeline, SimContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_count() -> usize {
    1
}

/// `count` specimens waiting at `stage` when the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WipEntry {
    pub stage: Stage,
    pub priority: Priority,
    pub source: Source,
    #[serde(default = "default_count")]
    pub count: usize,
}

/// Elapsed work time and transit time of one replayed stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageRecord {
    pub elapsed: SimTime,
    pub transit: SimTime,
}

/// Replayed history of one bootstrapped specimen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BootstrapRecord {
    stages: BTreeMap<Stage, StageRecord>,
}

impl BootstrapRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, stage: Stage, elapsed: SimTime, transit: SimTime) {
        self.stages.insert(stage, StageRecord { elapsed, transit });
    }

    pub fn get(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.get(&stage)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Timestamps of the replayed stages, anchored so the last one's transit
    /// ends at t=0.
    ///
    /// # Example
    ///
    /// ```
    /// use hpath_sim_core::bootstrap::BootstrapRecord;
    /// use hpath_sim_core::models::Stage;
    ///
    /// let mut record = BootstrapRecord::new();
    /// record.insert(Stage::Reception, 2.0, 1.0);
    /// record.insert(Stage::Cutup, 0.5, 0.25);
    ///
    /// let times = record.timestamps();
    /// assert_eq!(times[&Stage::Cutup].end, Some(-0.25));
    /// assert_eq!(times[&Stage::Cutup].start, -0.75);
    /// assert_eq!(times[&Stage::Reception].end, Some(-1.75));
    /// assert_eq!(times[&Stage::Reception].start, -3.75);
    /// ```
    pub fn timestamps(&self) -> BTreeMap<Stage, StageTimes> {
        let mut times = BTreeMap::new();
        let mut cursor = 0.0;
        for (&stage, record) in self.stages.iter().rev() {
            let end = cursor - record.transit;
            let start = end - record.elapsed;
            times.insert(
                stage,
                StageTimes {
                    start,
                    end: Some(end),
                    transit: Some(record.transit),
                },
            );
            cursor = start;
        }
        times
    }
}

/// Replay every stage before `awaiting` for `specimen`.
///
/// On return the specimen carries its synthesised timestamps and children;
/// the caller enters it into the live pipeline at `awaiting` at t=0.
pub fn warm_start(
    ctx: &mut SimContext,
    pipeline: &Pipeline,
    specimen: &mut Specimen,
    awaiting: Stage,
) -> Result<BootstrapRecord, SimulationError> {
    let mut record = BootstrapRecord::new();

    for &stage in awaiting.predecessors() {
        let plan = pipeline.plan(ctx, specimen, stage)?;
        let mut elapsed = 0.0;
        for step in &plan.steps {
            elapsed += ctx.work(step.work())?;
        }
        plan.outcome.apply(specimen)?;
        let transit = match plan.transit {
            Some(task) => ctx.duration(task)?,
            None => 0.0,
        };
        record.insert(stage, elapsed, transit);
    }

    for (stage, times) in record.timestamps() {
        specimen.set_stage_times(stage, times);
    }
    Ok(record)
}
