//! Microtomy: cut slides from every block.

use super::{
    missing_children, reachable, residual, tables_by_priority, Outcome, Requirements, SimContext,
    StageHandler, StagePlan, Step, Work,
};
use crate::config::{Globals, Task};
use crate::models::{BlockType, SlideType, Specimen, Stage};
use crate::orchestrator::SimulationError;
use crate::resources::Resource;

#[derive(Debug, Clone, Copy, Default)]
pub struct MicrotomyHandler;

fn microtomy_task(slide_type: SlideType) -> Task {
    match slide_type {
        SlideType::Levels => Task::MicrotomyLevels,
        SlideType::Serials => Task::MicrotomySerials,
        SlideType::Larges => Task::MicrotomyLarges,
        SlideType::Megas => Task::MicrotomyMegas,
    }
}

impl StageHandler for MicrotomyHandler {
    fn stage(&self) -> Stage {
        Stage::Microtomy
    }

    fn plan(
        &self,
        ctx: &mut SimContext,
        specimen: &Specimen,
    ) -> Result<StagePlan, SimulationError> {
        if specimen.blocks().is_empty() {
            return Err(missing_children(specimen, Stage::Microtomy, "blocks"));
        }
        let p = ctx.probabilities(specimen.priority());

        let mut work = Vec::with_capacity(specimen.num_blocks());
        let mut batches = Vec::with_capacity(specimen.num_blocks());
        for block in specimen.blocks() {
            let slide_type = match block.block_type() {
                BlockType::SmallSurgical if ctx.u01() < p.prob_microtomy_levels => {
                    SlideType::Levels
                }
                BlockType::SmallSurgical => SlideType::Serials,
                BlockType::LargeSurgical => SlideType::Larges,
                BlockType::Mega => SlideType::Megas,
            };
            work.push(Work::once(microtomy_task(slide_type)));
            batches.push((slide_type, ctx.slide_count(slide_type)?));
        }

        Ok(StagePlan::new(
            Stage::Microtomy,
            vec![Step::new(vec![Resource::MicrotomyStaff], work)],
            Outcome::Slides(batches),
            Some(Task::MicrotomyToStaining),
        ))
    }

    fn requirements(&self, globals: &Globals, req: &mut Requirements) {
        req.resource(Resource::MicrotomyStaff)
            .task(Task::MicrotomyToStaining);

        let block_types: Vec<BlockType> = req.block_types.iter().copied().collect();
        for block_type in block_types {
            match block_type {
                BlockType::SmallSurgical => {
                    for (_, p) in tables_by_priority(globals) {
                        if reachable(p.prob_microtomy_levels) {
                            req.slide_types.insert(SlideType::Levels);
                        }
                        if residual(p.prob_microtomy_levels) {
                            req.slide_types.insert(SlideType::Serials);
                        }
                    }
                }
                BlockType::LargeSurgical => {
                    req.slide_types.insert(SlideType::Larges);
                }
                BlockType::Mega => {
                    req.slide_types.insert(SlideType::Megas);
                }
            }
        }

        let tasks: Vec<Task> = req.slide_types.iter().copied().map(microtomy_task).collect();
        req.tasks(&tasks);
    }
}
