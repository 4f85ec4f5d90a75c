//! Cut-up: BMS, pool or large-specimen branch, each producing blocks.
//!
//! BMS cut-up yields one small surgical block and pool cut-up one large
//! surgical block. Large-specimen cut-up is done by a pathologist and yields
//! a sampled number of large surgical blocks, or of mega blocks for routine
//! specimens. Urgent specimens never produce mega blocks.

use super::{
    reachable, residual, tables_by_priority, Outcome, Requirements, SimContext, StageHandler,
    StagePlan, Step,
};
use crate::config::{Globals, Task};
use crate::models::{BlockType, CutupType, Priority, Specimen, Stage};
use crate::orchestrator::SimulationError;
use crate::resources::Resource;

#[derive(Debug, Clone, Copy, Default)]
pub struct CutupHandler;

impl StageHandler for CutupHandler {
    fn stage(&self) -> Stage {
        Stage::Cutup
    }

    fn plan(
        &self,
        ctx: &mut SimContext,
        specimen: &Specimen,
    ) -> Result<StagePlan, SimulationError> {
        let p = ctx.probabilities(specimen.priority());
        let r = ctx.u01();

        let (cutup_type, resource, task, transit, blocks) = if r < p.prob_bms_cutup {
            (
                CutupType::Bms,
                Resource::Bms,
                Task::CutUpBms,
                Task::CutupBmsToProcessing,
                vec![BlockType::SmallSurgical],
            )
        } else if r < p.prob_bms_cutup + p.prob_pool_cutup {
            (
                CutupType::Pool,
                Resource::CutUpAssistant,
                Task::CutUpPool,
                Task::CutupPoolToProcessing,
                vec![BlockType::LargeSurgical],
            )
        } else {
            let block_type = match specimen.priority() {
                Priority::Urgent => BlockType::LargeSurgical,
                Priority::Routine if ctx.u01() < p.prob_mega_blocks => BlockType::Mega,
                Priority::Routine => BlockType::LargeSurgical,
            };
            let count = ctx.block_count(block_type)?;
            (
                CutupType::LargeSpecimens,
                Resource::Pathologist,
                Task::CutUpLargeSpecimens,
                Task::CutupLargeToProcessing,
                vec![block_type; count],
            )
        };

        Ok(StagePlan::new(
            Stage::Cutup,
            vec![Step::tasks(vec![resource], &[task])],
            Outcome::Cutup { cutup_type, blocks },
            Some(transit),
        ))
    }

    fn requirements(&self, globals: &Globals, req: &mut Requirements) {
        for (priority, p) in tables_by_priority(globals) {
            if reachable(p.prob_bms_cutup) {
                req.resource(Resource::Bms)
                    .tasks(&[Task::CutUpBms, Task::CutupBmsToProcessing]);
                req.block_types.insert(BlockType::SmallSurgical);
            }
            if reachable(p.prob_pool_cutup) {
                req.resource(Resource::CutUpAssistant)
                    .tasks(&[Task::CutUpPool, Task::CutupPoolToProcessing]);
                req.block_types.insert(BlockType::LargeSurgical);
            }
            if residual(p.prob_bms_cutup + p.prob_pool_cutup) {
                req.resource(Resource::Pathologist)
                    .tasks(&[Task::CutUpLargeSpecimens, Task::CutupLargeToProcessing]);
                let mega = priority == Priority::Routine && reachable(p.prob_mega_blocks);
                let large = priority == Priority::Urgent || residual(p.prob_mega_blocks);
                if mega {
                    req.block_types.insert(BlockType::Mega);
                }
                if large {
                    req.block_types.insert(BlockType::LargeSurgical);
                }
            }
        }
    }
}
