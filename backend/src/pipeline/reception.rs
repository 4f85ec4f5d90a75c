//! Reception: sorting, optional pre-booking investigation, booking-in.

use super::{
    reachable, tables_by_priority, Outcome, Requirements, SimContext, StageHandler, StagePlan, Step,
    Work,
};
use crate::config::{Globals, Task};
use crate::models::{Source, Specimen, Stage};
use crate::orchestrator::SimulationError;
use crate::resources::Resource;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReceptionHandler;

impl StageHandler for ReceptionHandler {
    fn stage(&self) -> Stage {
        Stage::Reception
    }

    fn plan(
        &self,
        ctx: &mut SimContext,
        specimen: &Specimen,
    ) -> Result<StagePlan, SimulationError> {
        let p = ctx.probabilities(specimen.priority());
        let mut work = vec![Work::once(Task::ReceiveAndSort)];

        if ctx.u01() < p.prob_prebook {
            work.push(Work::once(Task::PreBookingInInvestigation));
        }

        match specimen.source() {
            Source::Internal => {
                work.push(Work::once(Task::BookingInInternal));
                let r = ctx.u01();
                if r < p.prob_invest_easy {
                    work.push(Work::once(Task::BookingInInvestigationInternalEasy));
                } else if r < p.prob_invest_easy + p.prob_invest_hard {
                    work.push(Work::once(Task::BookingInInvestigationInternalHard));
                }
            }
            Source::External => {
                work.push(Work::once(Task::BookingInExternal));
                if ctx.u01() < p.prob_invest_external {
                    work.push(Work::once(Task::BookingInInvestigationExternal));
                }
            }
        }

        Ok(StagePlan::new(
            Stage::Reception,
            vec![Step::new(vec![Resource::BookingInStaff], work)],
            Outcome::Nothing,
            Some(Task::ReceptionToCutup),
        ))
    }

    fn requirements(&self, globals: &Globals, req: &mut Requirements) {
        req.resource(Resource::BookingInStaff).tasks(&[
            Task::ReceiveAndSort,
            Task::BookingInInternal,
            Task::BookingInExternal,
            Task::ReceptionToCutup,
        ]);
        for (_, p) in tables_by_priority(globals) {
            if reachable(p.prob_prebook) {
                req.task(Task::PreBookingInInvestigation);
            }
            if reachable(p.prob_invest_easy) {
                req.task(Task::BookingInInvestigationInternalEasy);
            }
            if reachable(p.prob_invest_hard) {
                req.task(Task::BookingInInvestigationInternalHard);
            }
            if reachable(p.prob_invest_external) {
                req.task(Task::BookingInInvestigationExternal);
            }
        }
    }
}
