//! Staining and coverslipping.
//!
//! Regular slides go through the staining machine and then the coverslip
//! machine. Mega slides use the staining machine's mega programme and are
//! coverslipped by hand, one task per slide.

use super::{
    missing_children, Outcome, Requirements, SimContext, StageHandler, StagePlan, Step, Work,
};
use crate::config::{Globals, Task};
use crate::models::{Specimen, Stage};
use crate::orchestrator::SimulationError;
use crate::resources::Resource;

#[derive(Debug, Clone, Copy, Default)]
pub struct StainingHandler;

const REGULAR_STAINING: [Task; 3] = [
    Task::LoadStainingMachineRegular,
    Task::StainingRegular,
    Task::UnloadStainingMachineRegular,
];
const REGULAR_COVERSLIP: [Task; 3] = [
    Task::LoadCoverslipMachineRegular,
    Task::CoverslipRegular,
    Task::UnloadCoverslipMachineRegular,
];
const MEGA_STAINING: [Task; 3] = [
    Task::LoadStainingMachineMegas,
    Task::StainingMegas,
    Task::UnloadStainingMachineMegas,
];

impl StageHandler for StainingHandler {
    fn stage(&self) -> Stage {
        Stage::Staining
    }

    fn plan(
        &self,
        _ctx: &mut SimContext,
        specimen: &Specimen,
    ) -> Result<StagePlan, SimulationError> {
        let slide_type = specimen
            .slide_type()
            .ok_or_else(|| missing_children(specimen, Stage::Staining, "slides"))?;

        let steps = if slide_type.is_mega() {
            vec![
                Step::tasks(vec![Resource::StainingMachine], &MEGA_STAINING),
                Step::new(
                    vec![Resource::StainingStaff],
                    vec![Work::times(Task::CoverslipMegas, specimen.total_slides())],
                ),
            ]
        } else {
            vec![
                Step::tasks(vec![Resource::StainingMachine], &REGULAR_STAINING),
                Step::tasks(vec![Resource::CoverslipMachine], &REGULAR_COVERSLIP),
            ]
        };

        Ok(StagePlan::new(
            Stage::Staining,
            steps,
            Outcome::Nothing,
            Some(Task::StainingToLabelling),
        ))
    }

    fn requirements(&self, _globals: &Globals, req: &mut Requirements) {
        req.resource(Resource::StainingMachine)
            .task(Task::StainingToLabelling);
        if req.slide_types.iter().any(|t| t.is_mega()) {
            req.resource(Resource::StainingStaff)
                .tasks(&MEGA_STAINING)
                .task(Task::CoverslipMegas);
        }
        if req.slide_types.iter().any(|t| !t.is_mega()) {
            req.resource(Resource::CoverslipMachine)
                .tasks(&REGULAR_STAINING)
                .tasks(&REGULAR_COVERSLIP);
        }
    }
}
