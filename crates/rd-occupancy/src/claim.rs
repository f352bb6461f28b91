//! Claim, request and decision value types.

use std::fmt;

use rd_core::{HolderId, Timestamp};

use crate::resource::OccupancyResource;

/// An exclusive, time-bounded hold on one resource.
///
/// While `released_at` is `None` the claim is live.  Once released, the
/// claim stays on the ledger as a cooldown until `released_at + headway_ms`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccupancyClaim {
    pub resource:    OccupancyResource,
    pub holder:      HolderId,
    pub acquired_at: Timestamp,
    pub headway_ms:  u64,
    pub released_at: Option<Timestamp>,
}

impl OccupancyClaim {
    #[inline]
    pub fn is_live(&self) -> bool {
        self.released_at.is_none()
    }

    /// When the resource becomes free for other holders, as seen at `now`.
    ///
    /// A live claim has no release time yet, so the soonest it can free up
    /// is a release right now followed by the full headway.
    pub fn available_at(&self, now: Timestamp) -> Timestamp {
        match self.released_at {
            Some(t) => t.plus_ms(self.headway_ms),
            None    => self.acquired_at.max(now).plus_ms(self.headway_ms),
        }
    }
}

/// A holder asking for an ordered set of resources at `now`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccupancyRequest {
    pub holder:     HolderId,
    /// Treat the holder's own live claims as free.
    pub ignore_own: bool,
    pub now:        Timestamp,
    pub resources:  Vec<OccupancyResource>,
}

impl OccupancyRequest {
    pub fn new(
        holder: impl Into<HolderId>,
        now: Timestamp,
        resources: impl IntoIterator<Item = OccupancyResource>,
    ) -> Self {
        Self {
            holder: holder.into(),
            ignore_own: false,
            now,
            resources: resources.into_iter().collect(),
        }
    }

    pub fn ignoring_own(mut self) -> Self {
        self.ignore_own = true;
        self
    }
}

/// Signal aspect derived from how blocked a request is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalAspect {
    /// Every resource is free.
    Clear,
    /// Only cooldowns block, and all of them end within the caution window.
    Caution,
    /// A live claim blocks, or a cooldown ends beyond the caution window.
    Stop,
}

impl fmt::Display for SignalAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalAspect::Clear   => "clear",
            SignalAspect::Caution => "caution",
            SignalAspect::Stop    => "stop",
        })
    }
}

/// Outcome of evaluating a request.  Denials are values, never errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyDecision {
    pub allowed:  bool,
    /// Earliest time at which every requested resource is free.
    pub earliest: Timestamp,
    pub aspect:   SignalAspect,
    /// Claims standing in the way, in request order.
    pub blockers: Vec<OccupancyClaim>,
}
