//! Dispatch configuration.
//!
//! Typically loaded from a JSON file by the application crate (with the
//! `serde` feature) and passed to the build driver and occupancy managers.
//! Every field has a default, so a partial file is enough.  Call
//! [`DispatchConfig::validate`] after loading; the build entry points call
//! [`BuildConfig::validate`] themselves.

use crate::{CoreError, CoreResult};

/// Top-level configuration for one dispatch instance.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DispatchConfig {
    pub build:     BuildConfig,
    pub occupancy: OccupancyConfig,
}

impl DispatchConfig {
    pub fn validate(&self) -> CoreResult<()> {
        self.build.validate()
    }
}

/// Topology build tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildConfig {
    /// Work units a build job may spend per driver tick.
    pub step_budget_cells: usize,

    /// Radius (cells) searched around a marker for its anchor track cells.
    pub anchor_radius: u32,

    /// Radius (cells) searched around a requester or marker seed position.
    pub seed_radius: u32,

    /// Maximum number of "missing switcher" positions reported per build.
    pub missing_switcher_cap: usize,

    /// Speed limit (cells per second) given to every discovered edge.
    pub default_speed_limit: f32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            step_budget_cells:    4_096,
            anchor_radius:        2,
            seed_radius:          4,
            missing_switcher_cap: 32,
            default_speed_limit:  8.0,
        }
    }
}

impl BuildConfig {
    /// Reject settings no build can run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.step_budget_cells == 0 {
            return Err(CoreError::Config("step_budget_cells must be at least 1".into()));
        }
        if !self.default_speed_limit.is_finite() || self.default_speed_limit <= 0.0 {
            return Err(CoreError::Config(format!(
                "default_speed_limit must be a positive number, got {}",
                self.default_speed_limit
            )));
        }
        if self.anchor_radius > self.seed_radius {
            return Err(CoreError::Config(format!(
                "anchor_radius {} exceeds seed_radius {}",
                self.anchor_radius, self.seed_radius
            )));
        }
        Ok(())
    }
}

/// Interlocking tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OccupancyConfig {
    /// Minimum time (ms) a released resource stays unavailable to other holders.
    pub headway_ms: u64,

    /// Blockers that all clear within this window (ms) show `Caution`
    /// instead of `Stop`.
    pub caution_window_ms: u64,
}

impl Default for OccupancyConfig {
    fn default() -> Self {
        Self {
            headway_ms:        5_000,
            caution_window_ms: 10_000,
        }
    }
}
