//! Capacity-limited laboratory resources
//!
//! Every staff role and machine a stage needs is a [`Resource`]; each
//! replication owns one [`ResourcePool`] per configured resource.

mod pool;

pub use pool::{Acquire, ResourceError, ResourcePool, ResourceStats};

use crate::core::SimTime;
use crate::models::{Priority, SpecimenId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A named staff role or machine.
///
/// The derived ordering is the canonical acquisition order: a step that needs
/// several resources always requests them in this order, so two specimens
/// can never hold-and-wait on each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    BookingInStaff,
    Bms,
    CutUpAssistant,
    Pathologist,
    BoneStation,
    DecalcOven,
    ProcessingMachine,
    MicrotomyStaff,
    StainingMachine,
    CoverslipMachine,
    StainingStaff,
    LabellingStaff,
    Scanner,
    QcStaff,
}

impl Resource {
    pub const ALL: [Resource; 14] = [
        Resource::BookingInStaff,
        Resource::Bms,
        Resource::CutUpAssistant,
        Resource::Pathologist,
        Resource::BoneStation,
        Resource::DecalcOven,
        Resource::ProcessingMachine,
        Resource::MicrotomyStaff,
        Resource::StainingMachine,
        Resource::CoverslipMachine,
        Resource::StainingStaff,
        Resource::LabellingStaff,
        Resource::Scanner,
        Resource::QcStaff,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Resource::BookingInStaff => "booking_in_staff",
            Resource::Bms => "bms",
            Resource::CutUpAssistant => "cut_up_assistant",
            Resource::Pathologist => "pathologist",
            Resource::BoneStation => "bone_station",
            Resource::DecalcOven => "decalc_oven",
            Resource::ProcessingMachine => "processing_machine",
            Resource::MicrotomyStaff => "microtomy_staff",
            Resource::StainingMachine => "staining_machine",
            Resource::CoverslipMachine => "coverslip_machine",
            Resource::StainingStaff => "staining_staff",
            Resource::LabellingStaff => "labelling_staff",
            Resource::Scanner => "scanner",
            Resource::QcStaff => "qc_staff",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The full set of pools for one replication.
#[derive(Debug, Clone)]
pub struct ResourcePools {
    pools: BTreeMap<Resource, ResourcePool<SpecimenId>>,
}

impl ResourcePools {
    /// Build pools from configured capacities.
    ///
    /// Capacities are expected to have been validated already; a zero
    /// capacity is still rejected here rather than deadlocking later.
    pub fn new(capacities: &BTreeMap<Resource, u32>) -> Result<Self, ResourceError> {
        let pools = capacities
            .iter()
            .map(|(&resource, &capacity)| {
                ResourcePool::new(resource, capacity).map(|pool| (resource, pool))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self { pools })
    }

    pub fn get(&self, resource: Resource) -> Option<&ResourcePool<SpecimenId>> {
        self.pools.get(&resource)
    }

    /// Request one unit of `resource` for `specimen`.
    pub fn acquire(
        &mut self,
        resource: Resource,
        specimen: SpecimenId,
        priority: Priority,
        now: SimTime,
    ) -> Result<Acquire, ResourceError> {
        Ok(self.pool_mut(resource)?.acquire(specimen, priority, now))
    }

    /// Return one unit of `resource`; yields the specimen it was handed to.
    pub fn release(
        &mut self,
        resource: Resource,
        now: SimTime,
    ) -> Result<Option<SpecimenId>, ResourceError> {
        self.pool_mut(resource)?.release(now)
    }

    /// Close every pool's busy-time integral at `now`.
    pub fn settle(&mut self, now: SimTime) {
        for pool in self.pools.values_mut() {
            pool.settle(now);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourcePool<SpecimenId>> {
        self.pools.values()
    }

    fn pool_mut(
        &mut self,
        resource: Resource,
    ) -> Result<&mut ResourcePool<SpecimenId>, ResourceError> {
        self.pools
            .get_mut(&resource)
            .ok_or(ResourceError::UnknownResource(resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_resource() {
        let mut pools = ResourcePools::new(&BTreeMap::from([(Resource::Scanner, 2)])).unwrap();
        let err = pools
            .acquire(Resource::QcStaff, SpecimenId(0), Priority::Routine, 0.0)
            .unwrap_err();
        assert_eq!(err, ResourceError::UnknownResource(Resource::QcStaff));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = ResourcePools::new(&BTreeMap::from([(Resource::Scanner, 0)])).unwrap_err();
        assert_eq!(err, ResourceError::ZeroCapacity(Resource::Scanner));
    }
}
