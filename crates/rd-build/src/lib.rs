//! `rd-build` — stepped topology discovery and graph construction.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                           |
//! |---------------|--------------------------------------------------------------------|
//! | [`marker`]    | `MarkerSource` scanner interface, `NodeDefinition`, `MarkerTable`  |
//! | [`loader`]    | `load_markers_csv`, `load_markers_reader`                          |
//! | [`session`]   | `IncrementalSession` stepping contract                             |
//! | [`discovery`] | `FullScan`, `LocalTrace`, `DiscoveryReport`, `SeedSelection`       |
//! | [`explorer`]  | `MultiSourceExplorer`, `ExplorerOutcome`                           |
//! | [`job`]       | `GraphBuildJob`, `BuildObserver`, `BuildStatus`, `build_blocking`  |
//! | [`registry`]  | `BuildRegistry`, `RegistrySlot`                                    |
//! | [`error`]     | `BuildError`, `BuildResult<T>`                                     |
//!
//! # Driving a build
//!
//! ```
//! use std::sync::Arc;
//! use rd_core::{BuildConfig, CellPos, RegionId, StepBudget};
//! use rd_graph::{NodeType, TrackGrid};
//! use rd_build::{
//!     BuildRegistry, DiscoveryMode, GraphBuildJob, MarkerTable, NodeDefinition,
//!     NoopBuildObserver,
//! };
//!
//! let mut grid = TrackGrid::new();
//! grid.add_line(CellPos::new(0, 64, 0), CellPos::new(20, 64, 0));
//!
//! let region = RegionId::new("main");
//! let mut markers = MarkerTable::new();
//! markers.insert(region.clone(), NodeDefinition::new("A", NodeType::Station, CellPos::new(0, 65, 0)));
//! markers.insert(region.clone(), NodeDefinition::new("B", NodeType::Depot, CellPos::new(20, 65, 0)));
//!
//! let registry = BuildRegistry::new();
//! let mut job = GraphBuildJob::start(
//!     &registry,
//!     region,
//!     Arc::new(grid),
//!     Arc::new(markers),
//!     DiscoveryMode::Full,
//!     &BuildConfig::default(),
//! )
//! .unwrap();
//! while !job.is_done() {
//!     job.step(StepBudget::units(16), &mut NoopBuildObserver);
//! }
//! ```

pub mod discovery;
pub mod error;
pub mod explorer;
pub mod job;
pub mod loader;
pub mod marker;
pub mod registry;
pub mod session;

#[cfg(test)]
mod tests;

pub use discovery::{
    AnchoredNode, DiscoveryOutcome, DiscoveryReport, DiscoverySession, FullScan, LocalTrace,
    NodeConflict, SeedOrigin, SeedSelection,
};
pub use error::{BuildError, BuildResult};
pub use explorer::{ExploredEdge, ExplorerOutcome, MultiSourceExplorer};
pub use job::{
    build_blocking, BuildObserver, BuildOutput, BuildPhase, BuildStatus, DiscoveryMode,
    GraphBuildJob, NoopBuildObserver,
};
pub use loader::{load_markers_csv, load_markers_reader};
pub use marker::{MarkerSource, MarkerTable, NodeDefinition};
pub use registry::{BuildRegistry, RegistrySlot};
pub use session::IncrementalSession;
