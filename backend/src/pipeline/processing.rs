//! Processing: optional decalcification, then the processing machine.

use super::{
    missing_children, reachable, tables_by_priority, Outcome, Requirements, SimContext,
    StageHandler, StagePlan, Step,
};
use crate::config::{Globals, Task};
use crate::models::{BlockType, DecalcType, Priority, Specimen, Stage};
use crate::orchestrator::SimulationError;
use crate::resources::Resource;

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessingHandler;

fn decalc_step(decalc: DecalcType) -> Step {
    match decalc {
        DecalcType::BoneStation => Step::tasks(
            vec![Resource::BoneStation],
            &[Task::LoadBoneStation, Task::Decalc, Task::UnloadBoneStation],
        ),
        DecalcType::DecalcOven => Step::tasks(
            vec![Resource::DecalcOven],
            &[Task::LoadIntoDecalcOven, Task::Decalc, Task::UnloadFromDecalcOven],
        ),
    }
}

/// Processing programme for routine specimens, by block type.
fn programme(block_type: BlockType) -> Task {
    match block_type {
        BlockType::SmallSurgical => Task::ProcessingSmallSurgicals,
        BlockType::LargeSurgical => Task::ProcessingLargeSurgicals,
        BlockType::Mega => Task::ProcessingMegas,
    }
}

impl StageHandler for ProcessingHandler {
    fn stage(&self) -> Stage {
        Stage::Processing
    }

    fn plan(
        &self,
        ctx: &mut SimContext,
        specimen: &Specimen,
    ) -> Result<StagePlan, SimulationError> {
        let block_type = specimen
            .block_type()
            .ok_or_else(|| missing_children(specimen, Stage::Processing, "blocks"))?;
        let p = ctx.probabilities(specimen.priority());

        let r = ctx.u01();
        let decalc = if r < p.prob_decalc_bone {
            Some(DecalcType::BoneStation)
        } else if r < p.prob_decalc_bone + p.prob_decalc_oven {
            Some(DecalcType::DecalcOven)
        } else {
            None
        };

        let main = match specimen.priority() {
            Priority::Urgent => Task::ProcessingUrgent,
            Priority::Routine => programme(block_type),
        };

        let mut steps: Vec<Step> = decalc.map(decalc_step).into_iter().collect();
        steps.push(Step::tasks(
            vec![Resource::ProcessingMachine],
            &[Task::LoadProcessingMachine, main, Task::UnloadProcessingMachine],
        ));

        Ok(StagePlan::new(
            Stage::Processing,
            steps,
            Outcome::Decalc(decalc),
            Some(Task::ProcessingToMicrotomy),
        ))
    }

    fn requirements(&self, globals: &Globals, req: &mut Requirements) {
        for (_, p) in tables_by_priority(globals) {
            if reachable(p.prob_decalc_bone) {
                req.resource(Resource::BoneStation).tasks(&[
                    Task::LoadBoneStation,
                    Task::Decalc,
                    Task::UnloadBoneStation,
                ]);
            }
            if reachable(p.prob_decalc_oven) {
                req.resource(Resource::DecalcOven).tasks(&[
                    Task::LoadIntoDecalcOven,
                    Task::Decalc,
                    Task::UnloadFromDecalcOven,
                ]);
            }
        }

        req.resource(Resource::ProcessingMachine).tasks(&[
            Task::LoadProcessingMachine,
            Task::ProcessingUrgent,
            Task::UnloadProcessingMachine,
            Task::ProcessingToMicrotomy,
        ]);
        let routine: Vec<Task> = req.block_types.iter().copied().map(programme).collect();
        req.tasks(&routine);
    }
}
