//! `rd-core` — foundational types for the rail dispatch workspace.
//!
//! This crate is a dependency of every other `rd-*` crate.  It intentionally
//! has no `rd-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `NodeId`, `RegionId`, `HolderId`                      |
//! | [`geo`]         | `CellPos`, integer track-cell coordinates            |
//! | [`time`]        | `Timestamp`, `StepBudget`                             |
//! | [`config`]      | `DispatchConfig`, `BuildConfig`, `OccupancyConfig`    |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{BuildConfig, DispatchConfig, OccupancyConfig};
pub use error::{CoreError, CoreResult};
pub use geo::CellPos;
pub use ids::{HolderId, NodeId, RegionId};
pub use time::{StepBudget, Timestamp};
