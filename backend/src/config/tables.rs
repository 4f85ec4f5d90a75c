//! Named parameter tables consumed by the stage handlers
//!
//! - [`TaskDurations`]: one distribution per [`Task`] (transits included)
//! - [`BranchProbabilities`]: branching thresholds, with an optional urgent
//!   table that replaces the routine one for urgent specimens
//! - [`CountDistributions`]: how many blocks/slides a branch produces

use super::distribution::Distribution;
use crate::models::{BlockType, Priority, SlideType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

macro_rules! tasks {
    ($($variant:ident => $name:literal,)+) => {
        /// A unit of timed work with its own duration distribution.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Task {
            $($variant,)+
        }

        impl Task {
            pub const ALL: &'static [Task] = &[$(Task::$variant,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Task::$variant => $name,)+
                }
            }
        }
    };
}

tasks! {
    // Reception
    ReceiveAndSort => "receive_and_sort",
    PreBookingInInvestigation => "pre_booking_in_investigation",
    BookingInInternal => "booking_in_internal",
    BookingInExternal => "booking_in_external",
    BookingInInvestigationInternalEasy => "booking_in_investigation_internal_easy",
    BookingInInvestigationInternalHard => "booking_in_investigation_internal_hard",
    BookingInInvestigationExternal => "booking_in_investigation_external",
    ReceptionToCutup => "reception_to_cutup",
    // Cut-up
    CutUpBms => "cut_up_bms",
    CutUpPool => "cut_up_pool",
    CutUpLargeSpecimens => "cut_up_large_specimens",
    CutupBmsToProcessing => "cutup_bms_to_processing",
    CutupPoolToProcessing => "cutup_pool_to_processing",
    CutupLargeToProcessing => "cutup_large_to_processing",
    // Processing
    LoadBoneStation => "load_bone_station",
    Decalc => "decalc",
    UnloadBoneStation => "unload_bone_station",
    LoadIntoDecalcOven => "load_into_decalc_oven",
    UnloadFromDecalcOven => "unload_from_decalc_oven",
    LoadProcessingMachine => "load_processing_machine",
    ProcessingUrgent => "processing_urgent",
    ProcessingSmallSurgicals => "processing_small_surgicals",
    ProcessingLargeSurgicals => "processing_large_surgicals",
    ProcessingMegas => "processing_megas",
    UnloadProcessingMachine => "unload_processing_machine",
    ProcessingToMicrotomy => "processing_to_microtomy",
    // Microtomy
    MicrotomyLevels => "microtomy_levels",
    MicrotomySerials => "microtomy_serials",
    MicrotomyLarges => "microtomy_larges",
    MicrotomyMegas => "microtomy_megas",
    MicrotomyToStaining => "microtomy_to_staining",
    // Staining
    LoadStainingMachineRegular => "load_staining_machine_regular",
    StainingRegular => "staining_regular",
    UnloadStainingMachineRegular => "unload_staining_machine_regular",
    LoadCoverslipMachineRegular => "load_coverslip_machine_regular",
    CoverslipRegular => "coverslip_regular",
    UnloadCoverslipMachineRegular => "unload_coverslip_machine_regular",
    LoadStainingMachineMegas => "load_staining_machine_megas",
    StainingMegas => "staining_megas",
    UnloadStainingMachineMegas => "unload_staining_machine_megas",
    CoverslipMegas => "coverslip_megas",
    StainingToLabelling => "staining_to_labelling",
    // Labelling
    Labelling => "labelling",
    LabellingToScanning => "labelling_to_scanning",
    // Scanning
    LoadScanningMachineRegular => "load_scanning_machine_regular",
    ScanningRegular => "scanning_regular",
    UnloadScanningMachineRegular => "unload_scanning_machine_regular",
    LoadScanningMachineMegas => "load_scanning_machine_megas",
    ScanningMegas => "scanning_megas",
    UnloadScanningMachineMegas => "unload_scanning_machine_megas",
    ScanningToQc => "scanning_to_qc",
    // QC
    BlockAndQualityCheck => "block_and_quality_check",
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Duration distribution per task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskDurations(BTreeMap<Task, Distribution>);

impl TaskDurations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, task: Task) -> Option<&Distribution> {
        self.0.get(&task)
    }

    pub fn insert(&mut self, task: Task, distribution: Distribution) -> Option<Distribution> {
        self.0.insert(task, distribution)
    }

    pub fn remove(&mut self, task: Task) -> Option<Distribution> {
        self.0.remove(&task)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Task, &Distribution)> {
        self.0.iter().map(|(&task, d)| (task, d))
    }
}

impl FromIterator<(Task, Distribution)> for TaskDurations {
    fn from_iter<I: IntoIterator<Item = (Task, Distribution)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Branching thresholds compared against a uniform variate.
///
/// Threshold chains (`invest_easy + invest_hard`, `bms + pool`,
/// `decalc_bone + decalc_oven`) must sum to at most 1; the residual mass is
/// the chain's "else" branch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchProbabilities {
    pub prob_prebook: f64,
    pub prob_invest_easy: f64,
    pub prob_invest_hard: f64,
    pub prob_invest_external: f64,
    pub prob_bms_cutup: f64,
    pub prob_pool_cutup: f64,
    /// Ignored for urgent specimens, which never produce mega blocks
    pub prob_mega_blocks: f64,
    pub prob_decalc_bone: f64,
    pub prob_decalc_oven: f64,
    pub prob_microtomy_levels: f64,
}

impl BranchProbabilities {
    /// Every probability with its name.
    pub fn entries(&self) -> [(&'static str, f64); 10] {
        [
            ("prob_prebook", self.prob_prebook),
            ("prob_invest_easy", self.prob_invest_easy),
            ("prob_invest_hard", self.prob_invest_hard),
            ("prob_invest_external", self.prob_invest_external),
            ("prob_bms_cutup", self.prob_bms_cutup),
            ("prob_pool_cutup", self.prob_pool_cutup),
            ("prob_mega_blocks", self.prob_mega_blocks),
            ("prob_decalc_bone", self.prob_decalc_bone),
            ("prob_decalc_oven", self.prob_decalc_oven),
            ("prob_microtomy_levels", self.prob_microtomy_levels),
        ]
    }

    /// Threshold chains whose members are cumulated against one variate.
    pub fn chains(&self) -> [(&'static str, f64); 3] {
        [
            (
                "prob_invest_easy + prob_invest_hard",
                self.prob_invest_easy + self.prob_invest_hard,
            ),
            (
                "prob_bms_cutup + prob_pool_cutup",
                self.prob_bms_cutup + self.prob_pool_cutup,
            ),
            (
                "prob_decalc_bone + prob_decalc_oven",
                self.prob_decalc_bone + self.prob_decalc_oven,
            ),
        ]
    }
}

/// How many children a branch produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountDistributions {
    pub num_blocks_large_surgical: Distribution,
    pub num_blocks_mega: Distribution,
    pub num_slides_larges: Distribution,
    pub num_slides_levels: Distribution,
    pub num_slides_megas: Distribution,
    pub num_slides_serials: Distribution,
}

impl CountDistributions {
    /// Block count for the "large specimens" cut-up branch.
    ///
    /// Small surgical blocks only come from BMS cut-up, one at a time, so
    /// they have no count distribution.
    pub fn blocks(&self, block_type: BlockType) -> Option<&Distribution> {
        match block_type {
            BlockType::SmallSurgical => None,
            BlockType::LargeSurgical => Some(&self.num_blocks_large_surgical),
            BlockType::Mega => Some(&self.num_blocks_mega),
        }
    }

    pub fn slides(&self, slide_type: SlideType) -> &Distribution {
        match slide_type {
            SlideType::Levels => &self.num_slides_levels,
            SlideType::Serials => &self.num_slides_serials,
            SlideType::Larges => &self.num_slides_larges,
            SlideType::Megas => &self.num_slides_megas,
        }
    }

    pub fn entries(&self) -> [(&'static str, &Distribution); 6] {
        [
            ("num_blocks_large_surgical", &self.num_blocks_large_surgical),
            ("num_blocks_mega", &self.num_blocks_mega),
            ("num_slides_larges", &self.num_slides_larges),
            ("num_slides_levels", &self.num_slides_levels),
            ("num_slides_megas", &self.num_slides_megas),
            ("num_slides_serials", &self.num_slides_serials),
        ]
    }
}

/// Global branching and count parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Globals {
    pub probabilities: BranchProbabilities,
    /// Replaces `probabilities` for urgent specimens when present
    #[serde(default)]
    pub urgent: Option<BranchProbabilities>,
    pub counts: CountDistributions,
}

impl Globals {
    /// The threshold table that applies to a specimen of `priority`.
    pub fn table(&self, priority: Priority) -> &BranchProbabilities {
        match (priority, &self.urgent) {
            (Priority::Urgent, Some(urgent)) => urgent,
            _ => &self.probabilities,
        }
    }

    /// Every distinct table in use.
    pub fn tables(&self) -> impl Iterator<Item = (Priority, &BranchProbabilities)> {
        std::iter::once((Priority::Routine, &self.probabilities))
            .chain(self.urgent.iter().map(|t| (Priority::Urgent, t)))
    }
}
