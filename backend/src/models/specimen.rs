//! Specimen / Block / Slide hierarchy
//!
//! A specimen owns its blocks and each block owns its slides, so every child
//! belongs to exactly one parent by construction. Children are produced once,
//! by cut-up (blocks) and microtomy (slides), and never re-derived.
//!
//! Each specimen also carries its per-stage timestamp record, which is what
//! the reporting side consumes.

use crate::core::SimTime;
use crate::models::stage::Stage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Index of a specimen within its replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpecimenId(pub usize);

impl fmt::Display for SpecimenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Specimen priority. `Urgent` sorts above `Routine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Routine,
    Urgent,
}

/// Where the specimen was sent from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutupType {
    Bms,
    Pool,
    LargeSpecimens,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecalcType {
    BoneStation,
    DecalcOven,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    SmallSurgical,
    LargeSurgical,
    Mega,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideType {
    Levels,
    Serials,
    Larges,
    Megas,
}

impl SlideType {
    /// Mega slides use their own staining and scanning chains.
    pub fn is_mega(self) -> bool {
        self == SlideType::Megas
    }
}

/// Errors raised when mutating the entity hierarchy
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Specimen {specimen} already has blocks")]
    BlocksAlreadyProduced { specimen: String },

    #[error("Block {block} already has slides")]
    SlidesAlreadyProduced { block: String },

    #[error("Specimen {specimen} cannot have zero {kind}")]
    NoChildren { specimen: String, kind: &'static str },

    #[error("Specimen {specimen} has {blocks} blocks but {given} slide batches were given")]
    SlideBatchMismatch {
        specimen: String,
        blocks: usize,
        given: usize,
    },
}

/// Start/end of one stage visit, plus the transit that followed it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTimes {
    /// Arrival at the stage (queueing included)
    pub start: SimTime,
    /// Release of the stage's last resource
    pub end: Option<SimTime>,
    /// Delivery time to the next stage
    pub transit: Option<SimTime>,
}

impl StageTimes {
    pub fn started(start: SimTime) -> Self {
        Self {
            start,
            end: None,
            transit: None,
        }
    }
}

/// Where a specimen currently is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum Position {
    /// Created but not yet entered into the stage (bootstrap insert point).
    Awaiting(Stage),
    /// Queued for or holding the stage's resources.
    InStage(Stage),
    /// Being delivered after finishing the given stage.
    InTransit(Stage),
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    name: String,
    slide_type: SlideType,
}

impl Slide {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slide_type(&self) -> SlideType {
        self.slide_type
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    name: String,
    block_type: BlockType,
    slides: Vec<Slide>,
}

impl Block {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn num_slides(&self) -> usize {
        self.slides.len()
    }
}

/// A patient sample and everything cut from it.
///
/// # Example
/// ```
/// use hpath_sim_core::models::{BlockType, Priority, Source, Specimen, SpecimenId};
///
/// let mut specimen = Specimen::new(SpecimenId(0), "S000001", Priority::Routine, Source::Internal);
/// specimen.add_blocks(&[BlockType::Mega, BlockType::Mega]).unwrap();
///
/// assert_eq!(specimen.blocks()[1].name(), "S000001.2");
/// assert_eq!(specimen.num_blocks(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specimen {
    id: SpecimenId,
    name: String,
    priority: Priority,
    source: Source,
    bootstrap: bool,
    cutup_type: Option<CutupType>,
    decalc_type: Option<DecalcType>,
    blocks: Vec<Block>,
    timestamps: BTreeMap<Stage, StageTimes>,
    position: Position,
}

impl Specimen {
    /// Create a fresh specimen waiting at Reception.
    pub fn new(
        id: SpecimenId,
        name: impl Into<String>,
        priority: Priority,
        source: Source,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            priority,
            source,
            bootstrap: false,
            cutup_type: None,
            decalc_type: None,
            blocks: Vec::new(),
            timestamps: BTreeMap::new(),
            position: Position::Awaiting(Stage::Reception),
        }
    }

    /// Mark the specimen as synthesised work-in-progress.
    pub fn into_bootstrap(mut self) -> Self {
        self.bootstrap = true;
        self
    }

    pub fn id(&self) -> SpecimenId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// True for specimens created by the warm start rather than by arrival.
    pub fn is_bootstrap(&self) -> bool {
        self.bootstrap
    }

    pub fn cutup_type(&self) -> Option<CutupType> {
        self.cutup_type
    }

    pub fn set_cutup_type(&mut self, cutup_type: CutupType) {
        self.cutup_type = Some(cutup_type);
    }

    pub fn decalc_type(&self) -> Option<DecalcType> {
        self.decalc_type
    }

    pub fn set_decalc_type(&mut self, decalc_type: DecalcType) {
        self.decalc_type = Some(decalc_type);
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn total_slides(&self) -> usize {
        self.blocks.iter().map(Block::num_slides).sum()
    }

    /// Type shared by all of this specimen's blocks.
    pub fn block_type(&self) -> Option<BlockType> {
        self.blocks.first().map(Block::block_type)
    }

    /// Type of the first slide; mega-ness is common to all slides of a specimen.
    pub fn slide_type(&self) -> Option<SlideType> {
        self.blocks
            .iter()
            .flat_map(|b| b.slides.iter())
            .next()
            .map(Slide::slide_type)
    }

    /// Produce this specimen's blocks. Allowed exactly once.
    pub fn add_blocks(&mut self, block_types: &[BlockType]) -> Result<(), ModelError> {
        if !self.blocks.is_empty() {
            return Err(ModelError::BlocksAlreadyProduced {
                specimen: self.name.clone(),
            });
        }
        if block_types.is_empty() {
            return Err(ModelError::NoChildren {
                specimen: self.name.clone(),
                kind: "blocks",
            });
        }
        self.blocks = block_types
            .iter()
            .enumerate()
            .map(|(i, &block_type)| Block {
                name: format!("{}.{}", self.name, i + 1),
                block_type,
                slides: Vec::new(),
            })
            .collect();
        Ok(())
    }

    /// Produce slides for every block; `batches[i]` belongs to block `i`.
    pub fn add_slides(&mut self, batches: &[(SlideType, usize)]) -> Result<(), ModelError> {
        if batches.len() != self.blocks.len() {
            return Err(ModelError::SlideBatchMismatch {
                specimen: self.name.clone(),
                blocks: self.blocks.len(),
                given: batches.len(),
            });
        }
        if let Some(block) = self.blocks.iter().find(|b| !b.slides.is_empty()) {
            return Err(ModelError::SlidesAlreadyProduced {
                block: block.name.clone(),
            });
        }
        if batches.iter().any(|&(_, count)| count == 0) {
            return Err(ModelError::NoChildren {
                specimen: self.name.clone(),
                kind: "slides",
            });
        }
        for (block, &(slide_type, count)) in self.blocks.iter_mut().zip(batches) {
            block.slides = (1..=count)
                .map(|n| Slide {
                    name: format!("{}.{}", block.name, n),
                    slide_type,
                })
                .collect();
        }
        Ok(())
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn is_finished(&self) -> bool {
        self.position == Position::Finished
    }

    /// Per-stage timestamp record, in pipeline order.
    pub fn timestamps(&self) -> &BTreeMap<Stage, StageTimes> {
        &self.timestamps
    }

    pub fn stage_times(&self, stage: Stage) -> Option<&StageTimes> {
        self.timestamps.get(&stage)
    }

    pub fn record_start(&mut self, stage: Stage, time: SimTime) {
        self.timestamps.insert(stage, StageTimes::started(time));
    }

    pub fn record_end(&mut self, stage: Stage, time: SimTime) {
        if let Some(times) = self.timestamps.get_mut(&stage) {
            times.end = Some(time);
        }
    }

    pub fn record_transit(&mut self, stage: Stage, transit: SimTime) {
        if let Some(times) = self.timestamps.get_mut(&stage) {
            times.transit = Some(transit);
        }
    }

    /// Overwrite a stage's record wholesale (warm-start reconstruction).
    pub fn set_stage_times(&mut self, stage: Stage, times: StageTimes) {
        self.timestamps.insert(stage, times);
    }
}
