//! One-active-build-per-region registry.
//!
//! The registry is a plain value that callers inject; tests can run as many
//! independent registries as they like.  Claiming a region returns a
//! [`RegistrySlot`] that frees the region when dropped, so a job releases
//! its slot on success, failure, cancellation or panic alike.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use rd_core::RegionId;

use crate::error::{BuildError, BuildResult};

/// Set of regions with a build in flight.  Cloning shares the set.
#[derive(Clone, Debug, Default)]
pub struct BuildRegistry {
    active: Arc<Mutex<HashSet<RegionId>>>,
}

impl BuildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `region`, or fail immediately if a build already holds it.
    pub fn try_claim(&self, region: &RegionId) -> BuildResult<RegistrySlot> {
        if !self.active.lock().insert(region.clone()) {
            return Err(BuildError::AlreadyRunning(region.clone()));
        }
        Ok(RegistrySlot { registry: self.clone(), region: region.clone() })
    }

    pub fn is_active(&self, region: &RegionId) -> bool {
        self.active.lock().contains(region)
    }

    /// Regions with a build in flight, sorted.
    pub fn active(&self) -> Vec<RegionId> {
        let mut regions: Vec<RegionId> = self.active.lock().iter().cloned().collect();
        regions.sort();
        regions
    }
}

/// Proof of a claimed region.  Dropping it frees the region.
#[derive(Debug)]
pub struct RegistrySlot {
    registry: BuildRegistry,
    region:   RegionId,
}

impl RegistrySlot {
    pub fn region(&self) -> &RegionId {
        &self.region
    }
}

impl Drop for RegistrySlot {
    fn drop(&mut self) {
        self.registry.active.lock().remove(&self.region);
    }
}
