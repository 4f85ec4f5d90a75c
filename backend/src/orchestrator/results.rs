//! Replication results
//!
//! Serialisable records handed to the reporting side. Timestamps are kept
//! raw; KPI aggregation happens elsewhere. Bootstrapped specimens are
//! included and flagged, since their history is a zero-queueing estimate.

use crate::core::SimTime;
use crate::models::{
    Block, BlockType, CutupType, DecalcType, Priority, SlideType, Source, Specimen, SpecimenId,
    Stage, StageTimes,
};
use crate::resources::{Resource, ResourcePool};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Final state of one specimen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecimenRecord {
    pub name: String,
    pub priority: Priority,
    pub source: Source,
    pub bootstrap: bool,
    pub completed: bool,
    pub cutup_type: Option<CutupType>,
    pub decalc_type: Option<DecalcType>,
    pub num_blocks: usize,
    pub total_slides: usize,
    /// Slides cut from each block, in block order
    pub slides_per_block: Vec<usize>,
    pub block_type: Option<BlockType>,
    pub slide_type: Option<SlideType>,
    pub timestamps: BTreeMap<Stage, StageTimes>,
}

impl From<&Specimen> for SpecimenRecord {
    fn from(specimen: &Specimen) -> Self {
        Self {
            name: specimen.name().to_string(),
            priority: specimen.priority(),
            source: specimen.source(),
            bootstrap: specimen.is_bootstrap(),
            completed: specimen.is_finished(),
            cutup_type: specimen.cutup_type(),
            decalc_type: specimen.decalc_type(),
            num_blocks: specimen.num_blocks(),
            total_slides: specimen.total_slides(),
            slides_per_block: specimen.blocks().iter().map(Block::num_slides).collect(),
            block_type: specimen.block_type(),
            slide_type: specimen.slide_type(),
            timestamps: specimen.timestamps().clone(),
        }
    }
}

impl SpecimenRecord {
    /// Reception start to QC end, for completed specimens.
    pub fn turnaround(&self) -> Option<SimTime> {
        let start = self.timestamps.get(&Stage::Reception)?.start;
        let end = self.timestamps.get(&Stage::Qc)?.end?;
        Some(end - start)
    }
}

/// Usage of one resource over the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub resource: Resource,
    pub capacity: u32,
    pub grants: usize,
    pub queued: usize,
    pub peak_queue_len: usize,
    pub utilisation: f64,
}

impl ResourceSummary {
    pub fn from_pool(pool: &ResourcePool<SpecimenId>, horizon: SimTime) -> Self {
        let stats = pool.stats();
        Self {
            resource: pool.resource(),
            capacity: pool.capacity(),
            grants: stats.grants,
            queued: stats.queued,
            peak_queue_len: stats.peak_queue_len,
            utilisation: pool.utilisation(horizon),
        }
    }
}

/// Everything one replication hands out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationResult {
    pub replication: usize,
    pub seed: u64,
    pub end_time: SimTime,
    pub completed: usize,
    pub specimens: Vec<SpecimenRecord>,
    pub resources: Vec<ResourceSummary>,
}

impl ReplicationResult {
    /// SHA-256 of the serialised specimen records, as lowercase hex.
    ///
    /// Two runs with the same configuration and seed produce the same digest.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(&self.specimens)?;

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        let result = hasher.finalize();

        Ok(format!("{:x}", result))
    }

    pub fn in_progress(&self) -> usize {
        self.specimens.len() - self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> SpecimenRecord {
        let mut timestamps = BTreeMap::new();
        timestamps.insert(
            Stage::Reception,
            StageTimes {
                start: 1.0,
                end: Some(2.0),
                transit: Some(0.5),
            },
        );
        timestamps.insert(
            Stage::Qc,
            StageTimes {
                start: 9.0,
                end: Some(10.0),
                transit: None,
            },
        );
        SpecimenRecord {
            name: name.to_string(),
            priority: Priority::Routine,
            source: Source::Internal,
            bootstrap: false,
            completed: true,
            cutup_type: Some(CutupType::Bms),
            decalc_type: None,
            num_blocks: 1,
            total_slides: 1,
            slides_per_block: vec![1],
            block_type: Some(BlockType::SmallSurgical),
            slide_type: Some(SlideType::Levels),
            timestamps,
        }
    }

    fn result(specimens: Vec<SpecimenRecord>) -> ReplicationResult {
        ReplicationResult {
            replication: 0,
            seed: 1,
            end_time: 10.0,
            completed: specimens.len(),
            specimens,
            resources: Vec::new(),
        }
    }

    #[test]
    fn test_turnaround() {
        assert_eq!(record("S1").turnaround(), Some(9.0));
    }

    #[test]
    fn test_digest_is_stable_and_content_sensitive() {
        let a = result(vec![record("S1")]).digest().unwrap();
        let b = result(vec![record("S1")]).digest().unwrap();
        let c = result(vec![record("S2")]).digest().unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_digest_ignores_replication_metadata() {
        let mut a = result(vec![record("S1")]);
        let b = result(vec![record("S1")]);
        a.replication = 7;
        a.seed = 99;
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
    }
}
