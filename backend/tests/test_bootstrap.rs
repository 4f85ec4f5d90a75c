//! Warm start of work-in-progress specimens

mod common;

use common::{approx_eq, stochastic_config, unit_config, wip};
use hpath_sim_core::bootstrap::warm_start;
use hpath_sim_core::models::{Event, Position, Priority, Source, Specimen, SpecimenId, Stage};
use hpath_sim_core::pipeline::{Pipeline, SimContext};
use hpath_sim_core::Model;
use std::sync::Arc;

fn stamp(specimen: &Specimen, stage: Stage) -> (f64, Option<f64>, Option<f64>) {
    let t = specimen.stage_times(stage).unwrap();
    (t.start, t.end, t.transit)
}

#[test]
fn test_wip_at_cutup_has_reception_history() {
    let mut config = unit_config();
    config.wip = vec![wip(Stage::Cutup, Priority::Routine, Source::Internal, 1)];
    let mut model = Model::new(Arc::new(config), 5).unwrap();

    let specimen = &model.specimens()[0];
    assert!(specimen.is_bootstrap());
    assert_eq!(specimen.position(), Position::Awaiting(Stage::Cutup));
    assert_eq!(stamp(specimen, Stage::Reception), (-3.0, Some(-1.0), Some(1.0)));
    assert!(specimen.stage_times(Stage::Cutup).is_none());

    model.run().unwrap();
    let specimen = &model.specimens()[0];
    assert!(specimen.is_finished());
    assert_eq!(stamp(specimen, Stage::Cutup), (0.0, Some(1.0), Some(1.0)));
    assert_eq!(stamp(specimen, Stage::Qc), (21.0, Some(22.0), None));
}

#[test]
fn test_wip_at_microtomy_has_blocks_but_no_slides() {
    let mut config = unit_config();
    config.wip = vec![wip(Stage::Microtomy, Priority::Urgent, Source::External, 1)];
    let model = Model::new(Arc::new(config), 5).unwrap();

    let specimen = &model.specimens()[0];
    assert_eq!(specimen.num_blocks(), 1);
    assert_eq!(specimen.total_slides(), 0);
    assert_eq!(stamp(specimen, Stage::Processing), (-4.0, Some(-1.0), Some(1.0)));
    assert_eq!(stamp(specimen, Stage::Cutup), (-6.0, Some(-5.0), Some(1.0)));
    assert_eq!(stamp(specimen, Stage::Reception), (-9.0, Some(-7.0), Some(1.0)));
}

#[test]
fn test_wip_at_qc_replays_seven_stages() {
    let mut config = unit_config();
    config.wip = vec![wip(Stage::Qc, Priority::Routine, Source::Internal, 1)];
    let mut model = Model::new(Arc::new(config), 5).unwrap();

    let specimen = &model.specimens()[0];
    assert_eq!(specimen.timestamps().len(), 7);
    assert_eq!(specimen.total_slides(), 1);
    assert_eq!(stamp(specimen, Stage::Reception).0, -24.0);
    assert_eq!(stamp(specimen, Stage::Scanning), (-4.0, Some(-1.0), Some(1.0)));

    model.run().unwrap();
    assert_eq!(stamp(&model.specimens()[0], Stage::Qc), (0.0, Some(1.0), None));
}

#[test]
fn test_wip_at_reception_has_no_history() {
    let mut config = unit_config();
    config.wip = vec![wip(Stage::Reception, Priority::Routine, Source::Internal, 2)];
    let mut model = Model::new(Arc::new(config), 5).unwrap();

    assert_eq!(model.specimens().len(), 2);
    assert!(model.specimens().iter().all(|s| s.timestamps().is_empty()));

    model.run().unwrap();
    let first = &model.specimens()[0];
    assert_eq!(stamp(first, Stage::Reception), (0.0, Some(2.0), Some(1.0)));
    // Both start at t=0; the second one queued.
    let second = &model.specimens()[1];
    assert_eq!(stamp(second, Stage::Reception), (0.0, Some(4.0), Some(1.0)));
}

#[test]
fn test_wip_entries_expand_in_order() {
    let mut config = unit_config();
    config.wip = vec![
        wip(Stage::Labelling, Priority::Urgent, Source::Internal, 3),
        wip(Stage::Processing, Priority::Routine, Source::External, 2),
    ];
    let model = Model::new(Arc::new(config), 5).unwrap();

    let specimens = model.specimens();
    assert_eq!(specimens.len(), 5);
    assert!(specimens.iter().all(|s| s.is_bootstrap()));
    assert!(specimens[..3]
        .iter()
        .all(|s| s.position() == Position::Awaiting(Stage::Labelling) && s.total_slides() == 1));
    assert!(specimens[3..]
        .iter()
        .all(|s| s.position() == Position::Awaiting(Stage::Processing) && s.num_blocks() == 1));
    assert_eq!(specimens[4].name(), "S000005");

    let arrivals = model.event_log().events_of_type("Arrival");
    assert_eq!(arrivals.len(), 5);
    assert!(arrivals
        .iter()
        .all(|e| matches!(e, Event::Arrival { time, bootstrap: true, .. } if *time == 0.0)));
}

#[test]
fn test_warm_start_history_ends_at_zero() {
    let config = Arc::new(stochastic_config());
    let pipeline = Pipeline::standard();
    let mut ctx = SimContext::new(Arc::clone(&config), 77);

    for (n, awaiting) in Stage::ALL.into_iter().enumerate() {
        for priority in [Priority::Routine, Priority::Urgent] {
            let mut specimen =
                Specimen::new(SpecimenId(n), format!("S{:06}", n + 1), priority, Source::Internal);
            let record = warm_start(&mut ctx, &pipeline, &mut specimen, awaiting).unwrap();

            assert_eq!(record.len(), awaiting.index());
            let Some(&last) = awaiting.predecessors().last() else {
                assert!(specimen.timestamps().is_empty());
                continue;
            };

            let last_times = specimen.stage_times(last).unwrap();
            let end = last_times.end.unwrap();
            assert!(approx_eq(end + last_times.transit.unwrap(), 0.0));
            assert!(stamp(&specimen, Stage::Reception).0 <= 0.0);

            for pair in awaiting.predecessors().windows(2) {
                let earlier = specimen.stage_times(pair[0]).unwrap();
                let later = specimen.stage_times(pair[1]).unwrap();
                let earlier_end = earlier.end.unwrap();
                assert!(earlier_end >= earlier.start);
                assert!(approx_eq(earlier_end + earlier.transit.unwrap(), later.start));
            }

            if awaiting > Stage::Cutup {
                assert!(specimen.num_blocks() >= 1);
            }
            if awaiting > Stage::Microtomy {
                assert!(specimen.blocks().iter().all(|b| b.num_slides() >= 1));
            }
            if priority == Priority::Urgent {
                assert_ne!(
                    specimen.block_type(),
                    Some(hpath_sim_core::models::BlockType::Mega)
                );
            }
        }
    }
}
