//! The cooperative stepping contract shared by every build session.

use rd_core::StepBudget;

/// A resumable, time-bounded unit of work.
///
/// Callers interleave `step` with their other periodic duties until
/// `is_done` reports completion.  A step never blocks and never does more
/// than `budget` allows.
pub trait IncrementalSession {
    fn is_done(&self) -> bool;

    /// Perform up to `budget` units of work and return how many were spent.
    fn step(&mut self, budget: StepBudget) -> usize;
}
