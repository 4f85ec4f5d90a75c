//! Labelling: one labelling task per slide.

use super::{
    missing_children, Outcome, Requirements, SimContext, StageHandler, StagePlan, Step, Work,
};
use crate::config::{Globals, Task};
use crate::models::{Specimen, Stage};
use crate::orchestrator::SimulationError;
use crate::resources::Resource;

#[derive(Debug, Clone, Copy, Default)]
pub struct LabellingHandler;

impl StageHandler for LabellingHandler {
    fn stage(&self) -> Stage {
        Stage::Labelling
    }

    fn plan(
        &self,
        _ctx: &mut SimContext,
        specimen: &Specimen,
    ) -> Result<StagePlan, SimulationError> {
        let slides = specimen.total_slides();
        if slides == 0 {
            return Err(missing_children(specimen, Stage::Labelling, "slides"));
        }
        Ok(StagePlan::new(
            Stage::Labelling,
            vec![Step::new(
                vec![Resource::LabellingStaff],
                vec![Work::times(Task::Labelling, slides)],
            )],
            Outcome::Nothing,
            Some(Task::LabellingToScanning),
        ))
    }

    fn requirements(&self, _globals: &Globals, req: &mut Requirements) {
        req.resource(Resource::LabellingStaff)
            .tasks(&[Task::Labelling, Task::LabellingToScanning]);
    }
}
