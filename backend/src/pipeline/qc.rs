//! Block and quality check, the terminal stage.

use super::{Outcome, Requirements, SimContext, StageHandler, StagePlan, Step};
use crate::config::{Globals, Task};
use crate::models::{Specimen, Stage};
use crate::orchestrator::SimulationError;
use crate::resources::Resource;

#[derive(Debug, Clone, Copy, Default)]
pub struct QcHandler;

impl StageHandler for QcHandler {
    fn stage(&self) -> Stage {
        Stage::Qc
    }

    fn plan(
        &self,
        _ctx: &mut SimContext,
        _specimen: &Specimen,
    ) -> Result<StagePlan, SimulationError> {
        Ok(StagePlan::new(
            Stage::Qc,
            vec![Step::tasks(vec![Resource::QcStaff], &[Task::BlockAndQualityCheck])],
            Outcome::Nothing,
            None,
        ))
    }

    fn requirements(&self, _globals: &Globals, req: &mut Requirements) {
        req.resource(Resource::QcStaff)
            .task(Task::BlockAndQualityCheck);
    }
}
