//! Domain models for the histopathology simulator

pub mod event;
pub mod specimen;
pub mod stage;

// Re-exports
pub use event::{Event, EventLog};
pub use specimen::{
    Block, BlockType, CutupType, DecalcType, ModelError, Position, Priority, Slide, SlideType,
    Source, Specimen, SpecimenId, StageTimes,
};
pub use stage::Stage;
