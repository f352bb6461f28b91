//! Time model: request timestamps and cooperative step budgets.
//!
//! # Timestamps
//!
//! Occupancy requests carry the caller's notion of "now" as a [`Timestamp`]
//! in milliseconds.  The interlocking never reads a clock itself, which keeps
//! every decision a pure function of its inputs and makes headway arithmetic
//! exact in tests.
//!
//! # Step budgets
//!
//! Long-running build sessions never block: each `step` call receives a
//! [`StepBudget`] and returns once either the unit count or the wall-clock
//! deadline is used up.  One "unit" is one marker parsed, one track cell
//! visited, or one frontier expansion, depending on the session.

use std::fmt;
use std::time::Instant;

// ── Timestamp ────────────────────────────────────────────────────────────────

/// An absolute point in time, in milliseconds since an epoch chosen by the host.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    #[inline]
    pub fn from_secs(secs: u64) -> Self {
        Timestamp(secs.saturating_mul(1_000))
    }

    /// The timestamp `ms` milliseconds after `self`, saturating at `u64::MAX`.
    #[inline]
    pub fn plus_ms(self, ms: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(ms))
    }

    /// Milliseconds elapsed from `earlier` to `self`, or 0 if `earlier` is later.
    #[inline]
    pub fn saturating_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Timestamp {
    type Output = Timestamp;
    #[inline]
    fn add(self, rhs: u64) -> Timestamp {
        self.plus_ms(rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

// ── StepBudget ───────────────────────────────────────────────────────────────

/// How often (in units) a deadline-bounded step re-reads the clock.
const DEADLINE_CHECK_STRIDE: usize = 64;

/// Bounded amount of work a stepped session may perform per invocation.
///
/// The deadline is not consulted for the first unit, so a session driven
/// with a non-empty budget makes progress even when the deadline is already
/// behind us.
#[derive(Copy, Clone, Debug)]
pub struct StepBudget {
    /// Maximum units of work for this call.
    pub max_units: usize,
    /// Optional wall-clock deadline, checked every few units.
    pub deadline: Option<Instant>,
}

impl StepBudget {
    /// At most `n` units, no deadline.
    pub fn units(n: usize) -> Self {
        Self { max_units: n.max(1), deadline: None }
    }

    /// As many units as fit before `deadline`.
    pub fn until(deadline: Instant) -> Self {
        Self { max_units: usize::MAX, deadline: Some(deadline) }
    }

    /// Run to completion.  Used by the synchronous build path.
    pub fn unbounded() -> Self {
        Self { max_units: usize::MAX, deadline: None }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// `true` if another unit may be performed after `used` units.
    #[inline]
    pub fn allows(&self, used: usize) -> bool {
        if used >= self.max_units {
            return false;
        }
        match self.deadline {
            Some(deadline) if used > 0 && used.is_multiple_of(DEADLINE_CHECK_STRIDE) => {
                Instant::now() < deadline
            }
            _ => true,
        }
    }

    /// The budget left after spending `used` units, keeping the deadline.
    /// May be empty; check [`allows`](Self::allows) before spending it.
    pub fn remaining(&self, used: usize) -> StepBudget {
        StepBudget {
            max_units: self.max_units.saturating_sub(used),
            deadline:  self.deadline,
        }
    }
}

impl Default for StepBudget {
    fn default() -> Self {
        Self::units(4_096)
    }
}
