//! Scanning: regular or mega scanner programme.

use super::{missing_children, Outcome, Requirements, SimContext, StageHandler, StagePlan, Step};
use crate::config::{Globals, Task};
use crate::models::{Specimen, Stage};
use crate::orchestrator::SimulationError;
use crate::resources::Resource;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanningHandler;

const REGULAR: [Task; 3] = [
    Task::LoadScanningMachineRegular,
    Task::ScanningRegular,
    Task::UnloadScanningMachineRegular,
];
const MEGAS: [Task; 3] = [
    Task::LoadScanningMachineMegas,
    Task::ScanningMegas,
    Task::UnloadScanningMachineMegas,
];

impl StageHandler for ScanningHandler {
    fn stage(&self) -> Stage {
        Stage::Scanning
    }

    fn plan(
        &self,
        _ctx: &mut SimContext,
        specimen: &Specimen,
    ) -> Result<StagePlan, SimulationError> {
        let slide_type = specimen
            .slide_type()
            .ok_or_else(|| missing_children(specimen, Stage::Scanning, "slides"))?;
        let tasks = if slide_type.is_mega() { &MEGAS } else { &REGULAR };

        Ok(StagePlan::new(
            Stage::Scanning,
            vec![Step::tasks(vec![Resource::Scanner], tasks)],
            Outcome::Nothing,
            Some(Task::ScanningToQc),
        ))
    }

    fn requirements(&self, _globals: &Globals, req: &mut Requirements) {
        req.resource(Resource::Scanner).task(Task::ScanningToQc);
        if req.slide_types.iter().any(|t| t.is_mega()) {
            req.tasks(&MEGAS);
        }
        if req.slide_types.iter().any(|t| !t.is_mega()) {
            req.tasks(&REGULAR);
        }
    }
}
