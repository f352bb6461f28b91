//! The occupancy ledger.
//!
//! Each resource has at most one ledger entry: its live claim, or, after
//! release, the claim kept as a cooldown marker until its headway runs out.
//!
//! ```text
//!   FREE ──acquire──▶ CLAIMED(holder) ──release──▶ COOLDOWN(until) ──time──▶ FREE
//! ```
//!
//! # Policy
//!
//! - A holder is never blocked by its own cooldown: re-acquiring right after
//!   a release is allowed.
//! - A holder's own live claims block it unless the request sets
//!   `ignore_own`, in which case they are refreshed on acquire.
//! - For a live claim of another holder, the earliest time reported is
//!   `now` plus headway: the claim would have to be released right away and
//!   then cool down in full.
//!
//! # Concurrency
//!
//! The ledger sits behind a `parking_lot::RwLock`.  Reads and snapshots take
//! the shared lock; `acquire` evaluates and records under one exclusive lock,
//! so two holders can never be granted the same resource.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;
use tracing::{debug, trace};

use rd_core::{HolderId, OccupancyConfig, Timestamp};

use crate::claim::{OccupancyClaim, OccupancyDecision, OccupancyRequest, SignalAspect};
use crate::resource::OccupancyResource;

type Ledger = BTreeMap<OccupancyResource, OccupancyClaim>;

/// Claim ledger for one region.
#[derive(Debug, Default)]
pub struct OccupancyManager {
    config: OccupancyConfig,
    ledger: RwLock<Ledger>,
}

impl OccupancyManager {
    pub fn new(config: OccupancyConfig) -> Self {
        Self { config, ledger: RwLock::new(Ledger::new()) }
    }

    pub fn config(&self) -> &OccupancyConfig {
        &self.config
    }

    /// Evaluate `request` without changing any claim.
    pub fn can_enter(&self, request: &OccupancyRequest) -> OccupancyDecision {
        let ledger = self.ledger.read();
        evaluate(&ledger, request, self.config.caution_window_ms)
    }

    /// Evaluate `request` and, only if every resource is free, claim all of
    /// them for the holder.  Nothing is recorded on denial.
    pub fn acquire(&self, request: &OccupancyRequest) -> OccupancyDecision {
        let mut ledger = self.ledger.write();
        self.acquire_locked(&mut ledger, request)
    }

    fn acquire_locked(&self, ledger: &mut Ledger, request: &OccupancyRequest) -> OccupancyDecision {
        let decision = evaluate(ledger, request, self.config.caution_window_ms);
        if !decision.allowed {
            debug!(
                holder = %request.holder,
                blockers = decision.blockers.len(),
                earliest = %decision.earliest,
                aspect = %decision.aspect,
                "occupancy denied"
            );
            return decision;
        }
        for resource in distinct(&request.resources) {
            ledger.insert(resource.clone(), OccupancyClaim {
                resource:    resource.clone(),
                holder:      request.holder.clone(),
                acquired_at: request.now,
                headway_ms:  self.config.headway_ms,
                released_at: None,
            });
        }
        trace!(holder = %request.holder, resources = request.resources.len(), "occupancy granted");
        decision
    }

    /// Release every live claim held by `holder` at `now`.  Returns how many
    /// were released; each enters cooldown.
    pub fn release_by_train(&self, holder: &HolderId, now: Timestamp) -> usize {
        let mut ledger = self.ledger.write();
        let mut released = 0;
        for claim in ledger.values_mut() {
            if claim.is_live() && &claim.holder == holder {
                claim.released_at = Some(now);
                released += 1;
            }
        }
        debug!(holder = %holder, released, "released all claims of holder");
        released
    }

    /// Release the live claim on `resource`.  With `expected` set, only a
    /// claim held by that holder is released.
    pub fn release_resource(
        &self,
        resource: &OccupancyResource,
        expected: Option<&HolderId>,
        now: Timestamp,
    ) -> bool {
        let mut ledger = self.ledger.write();
        match ledger.get_mut(resource) {
            Some(claim) if claim.is_live() && expected.is_none_or(|h| h == &claim.holder) => {
                claim.released_at = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Every ledger entry, live and cooling down, sorted by resource.
    pub fn snapshot_claims(&self) -> Vec<OccupancyClaim> {
        self.ledger.read().values().cloned().collect()
    }

    /// Live claims held by `holder`.
    pub fn claims_of(&self, holder: &HolderId) -> Vec<OccupancyClaim> {
        self.ledger
            .read()
            .values()
            .filter(|c| c.is_live() && &c.holder == holder)
            .cloned()
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.ledger.read().values().filter(|c| c.is_live()).count()
    }

    /// Drop cooldowns that have ended by `now`.  Returns how many.
    pub fn purge_expired(&self, now: Timestamp) -> usize {
        let mut ledger = self.ledger.write();
        let before = ledger.len();
        ledger.retain(|_, c| c.is_live() || c.available_at(now) > now);
        before - ledger.len()
    }

    /// Acquire for several simultaneous requests in a fixed order: request
    /// time first, then holder id.  Earlier requests win contested resources.
    pub fn arbitrate(&self, mut requests: Vec<OccupancyRequest>) -> Vec<(HolderId, OccupancyDecision)> {
        requests.sort_by(|a, b| a.now.cmp(&b.now).then_with(|| a.holder.cmp(&b.holder)));
        let mut ledger = self.ledger.write();
        requests
            .into_iter()
            .map(|req| {
                let decision = self.acquire_locked(&mut ledger, &req);
                (req.holder, decision)
            })
            .collect()
    }
}

/// Requested resources with duplicates removed, first occurrence kept.
fn distinct(resources: &[OccupancyResource]) -> impl Iterator<Item = &OccupancyResource> {
    let mut seen = BTreeSet::new();
    resources.iter().filter(move |r| seen.insert(*r))
}

fn evaluate(ledger: &Ledger, request: &OccupancyRequest, caution_window_ms: u64) -> OccupancyDecision {
    let now = request.now;
    let mut earliest = now;
    let mut blockers = Vec::new();
    let mut live_blocker = false;

    for resource in distinct(&request.resources) {
        let Some(claim) = ledger.get(resource) else {
            continue;
        };
        let own = claim.holder == request.holder;
        let blocked = if claim.is_live() {
            !(own && request.ignore_own)
        } else {
            !own && now < claim.available_at(now)
        };
        if blocked {
            live_blocker |= claim.is_live();
            earliest = earliest.max(claim.available_at(now));
            blockers.push(claim.clone());
        }
    }

    let aspect = if blockers.is_empty() {
        SignalAspect::Clear
    } else if !live_blocker && earliest <= now.plus_ms(caution_window_ms) {
        SignalAspect::Caution
    } else {
        SignalAspect::Stop
    };

    OccupancyDecision { allowed: blockers.is_empty(), earliest, aspect, blockers }
}
