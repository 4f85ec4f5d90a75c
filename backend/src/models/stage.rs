//! Pipeline stages
//!
//! The eight sequential steps every specimen passes through, in order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the eight laboratory stages.
///
/// The derived ordering follows the pipeline: `Reception < Cutup < ... < Qc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Reception,
    Cutup,
    Processing,
    Microtomy,
    Staining,
    Labelling,
    Scanning,
    Qc,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 8] = [
        Stage::Reception,
        Stage::Cutup,
        Stage::Processing,
        Stage::Microtomy,
        Stage::Staining,
        Stage::Labelling,
        Stage::Scanning,
        Stage::Qc,
    ];

    /// Position of this stage in [`Stage::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// The stage that follows this one, `None` for QC.
    pub fn next(self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }

    /// Stages that must be completed before a specimen can wait at `self`.
    pub fn predecessors(self) -> &'static [Stage] {
        &Stage::ALL[..self.index()]
    }

    pub fn is_terminal(self) -> bool {
        self == Stage::Qc
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Reception => "reception",
            Stage::Cutup => "cutup",
            Stage::Processing => "processing",
            Stage::Microtomy => "microtomy",
            Stage::Staining => "staining",
            Stage::Labelling => "labelling",
            Stage::Scanning => "scanning",
            Stage::Qc => "qc",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_and_next() {
        assert_eq!(Stage::Reception.next(), Some(Stage::Cutup));
        assert_eq!(Stage::Scanning.next(), Some(Stage::Qc));
        assert_eq!(Stage::Qc.next(), None);
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
    }

    #[test]
    fn test_predecessors() {
        assert!(Stage::Reception.predecessors().is_empty());
        assert_eq!(
            Stage::Processing.predecessors(),
            &[Stage::Reception, Stage::Cutup]
        );
    }
}
