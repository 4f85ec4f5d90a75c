//! Stage pipeline
//!
//! The lab is a fixed sequence of eight [`Stage`]s. Each stage is driven by
//! a [`StageHandler`] that turns a specimen into a [`StagePlan`]: the
//! resource-holding [`Step`]s to perform, the routing [`Outcome`] to apply
//! once the last step releases, and the transit task towards the next stage.
//!
//! Handlers only *plan*; acquiring, timing and releasing is the engine's
//! job. This lets the warm start reuse exactly the same routing logic with
//! zero queueing.
//!
//! # Draw order
//!
//! Branch variates are drawn in [`StageHandler::plan`], in a fixed order per
//! stage. Durations are drawn by the engine step by step, after each step's
//! resources have been granted. Transit is drawn after the outcome is applied.
//!
//! # Example
//!
//! ```
//! use hpath_sim_core::models::Stage;
//! use hpath_sim_core::pipeline::Pipeline;
//!
//! let pipeline = Pipeline::standard();
//! assert_eq!(pipeline.handler(Stage::Labelling).stage(), Stage::Labelling);
//! ```

pub mod context;
mod cutup;
mod labelling;
mod microtomy;
mod processing;
mod qc;
mod reception;
mod scanning;
mod staining;

pub use context::{SimContext, Work};
pub use cutup::CutupHandler;
pub use labelling::LabellingHandler;
pub use microtomy::MicrotomyHandler;
pub use processing::ProcessingHandler;
pub use qc::QcHandler;
pub use reception::ReceptionHandler;
pub use scanning::ScanningHandler;
pub use staining::StainingHandler;

use crate::config::{BranchProbabilities, Globals, Task};
use crate::models::{
    BlockType, CutupType, DecalcType, ModelError, Priority, SlideType, Specimen, Stage,
};
use crate::orchestrator::SimulationError;
use crate::resources::Resource;
use std::collections::BTreeSet;
use std::fmt;

/// One resource-holding step: acquire every resource, do the work, release.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    resources: Vec<Resource>,
    work: Vec<Work>,
}

impl Step {
    /// Resources are kept in canonical acquisition order, without duplicates.
    pub fn new(mut resources: Vec<Resource>, work: Vec<Work>) -> Self {
        resources.sort();
        resources.dedup();
        Self { resources, work }
    }

    /// Convenience for steps where every task runs once.
    pub fn tasks(resources: Vec<Resource>, tasks: &[Task]) -> Self {
        Self::new(resources, tasks.iter().copied().map(Work::once).collect())
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn work(&self) -> &[Work] {
        &self.work
    }
}

/// Routing decision recorded on the specimen once its stage completes.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Nothing,
    Cutup {
        cutup_type: CutupType,
        blocks: Vec<BlockType>,
    },
    Decalc(Option<DecalcType>),
    /// One `(slide type, count)` batch per block, in block order
    Slides(Vec<(SlideType, usize)>),
}

impl Outcome {
    pub fn apply(&self, specimen: &mut Specimen) -> Result<(), ModelError> {
        match self {
            Outcome::Nothing => Ok(()),
            Outcome::Cutup { cutup_type, blocks } => {
                specimen.add_blocks(blocks)?;
                specimen.set_cutup_type(*cutup_type);
                Ok(())
            }
            Outcome::Decalc(decalc) => {
                if let Some(decalc) = decalc {
                    specimen.set_decalc_type(*decalc);
                }
                Ok(())
            }
            Outcome::Slides(batches) => specimen.add_slides(batches),
        }
    }
}

/// What a specimen will do at one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StagePlan {
    pub stage: Stage,
    pub steps: Vec<Step>,
    pub outcome: Outcome,
    /// Transit towards the next stage; `None` at the terminal stage
    pub transit: Option<Task>,
}

impl StagePlan {
    pub fn new(stage: Stage, steps: Vec<Step>, outcome: Outcome, transit: Option<Task>) -> Self {
        Self {
            stage,
            steps,
            outcome,
            transit,
        }
    }
}

/// Tasks, resources and child types reachable under a set of tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    pub tasks: BTreeSet<Task>,
    pub resources: BTreeSet<Resource>,
    pub block_types: BTreeSet<BlockType>,
    pub slide_types: BTreeSet<SlideType>,
}

impl Requirements {
    pub fn task(&mut self, task: Task) -> &mut Self {
        self.tasks.insert(task);
        self
    }

    pub fn tasks(&mut self, tasks: &[Task]) -> &mut Self {
        self.tasks.extend(tasks.iter().copied());
        self
    }

    pub fn resource(&mut self, resource: Resource) -> &mut Self {
        self.resources.insert(resource);
        self
    }
}

/// Routing logic of one stage.
pub trait StageHandler: fmt::Debug + Send + Sync {
    fn stage(&self) -> Stage;

    /// Draw this stage's branches for `specimen` and describe the work.
    fn plan(&self, ctx: &mut SimContext, specimen: &Specimen) -> Result<StagePlan, SimulationError>;

    /// Add what this stage can reach, given what earlier stages produce.
    fn requirements(&self, globals: &Globals, req: &mut Requirements);
}

/// The handler table, one entry per stage in pipeline order.
#[derive(Debug)]
pub struct Pipeline {
    handlers: Vec<Box<dyn StageHandler>>,
}

impl Pipeline {
    pub fn standard() -> Self {
        let handlers: Vec<Box<dyn StageHandler>> = vec![
            Box::new(ReceptionHandler),
            Box::new(CutupHandler),
            Box::new(ProcessingHandler),
            Box::new(MicrotomyHandler),
            Box::new(StainingHandler),
            Box::new(LabellingHandler),
            Box::new(ScanningHandler),
            Box::new(QcHandler),
        ];
        debug_assert!(handlers
            .iter()
            .zip(Stage::ALL.iter())
            .all(|(h, &s)| h.stage() == s));
        Self { handlers }
    }

    pub fn handler(&self, stage: Stage) -> &dyn StageHandler {
        self.handlers[stage.index()].as_ref()
    }

    pub fn plan(
        &self,
        ctx: &mut SimContext,
        specimen: &Specimen,
        stage: Stage,
    ) -> Result<StagePlan, SimulationError> {
        self.handler(stage).plan(ctx, specimen)
    }

    /// Everything reachable from a fresh specimen of any priority and source.
    pub fn requirements(&self, globals: &Globals) -> Requirements {
        let mut req = Requirements::default();
        for handler in &self.handlers {
            handler.requirements(globals, &mut req);
        }
        req
    }
}

/// Both priorities with the table each one uses.
pub(crate) fn tables_by_priority(globals: &Globals) -> [(Priority, &BranchProbabilities); 2] {
    [
        (Priority::Routine, globals.table(Priority::Routine)),
        (Priority::Urgent, globals.table(Priority::Urgent)),
    ]
}

/// An explicit branch is reachable when its probability is positive.
pub(crate) fn reachable(probability: f64) -> bool {
    probability > 0.0
}

/// An "else" branch is reachable when its chain leaves residual mass.
///
/// Mirrors the runtime test `r < chain_sum` with `r` in `[0, 1)`: any sum
/// below 1 leaves room for the else branch.
pub(crate) fn residual(chain_sum: f64) -> bool {
    chain_sum < 1.0
}

pub(crate) fn missing_children(
    specimen: &Specimen,
    stage: Stage,
    kind: &'static str,
) -> SimulationError {
    SimulationError::MissingChildren {
        specimen: specimen.name().to_string(),
        stage,
        kind,
    }
}
