//! `rd-occupancy` — the interlocking: exclusive, headway-respecting claims
//! on track resources.
//!
//! | Module       | Contents                                                          |
//! |--------------|-------------------------------------------------------------------|
//! | [`resource`] | `OccupancyResource`, `ResourceKind`, `ResourceResolver`, `EdgeJunctionResolver` |
//! | [`claim`]    | `OccupancyClaim`, `OccupancyRequest`, `OccupancyDecision`, `SignalAspect` |
//! | [`manager`]  | `OccupancyManager`                                                |
//! | [`error`]    | `OccupancyError`, `OccupancyResult<T>`                            |
//!
//! `acquire` is all-or-nothing: a request either claims every resource it
//! names or none of them.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                    |
//! |---------|-----------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on claims and requests. |

pub mod claim;
pub mod error;
pub mod manager;
pub mod resource;


pub use claim::{OccupancyClaim, OccupancyDecision, OccupancyRequest, SignalAspect};
pub use error::{OccupancyError, OccupancyResult};
pub use manager::OccupancyManager;
pub use resource::{EdgeJunctionResolver, OccupancyResource, ResourceKind, ResourceResolver};
