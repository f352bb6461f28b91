//! `rd-graph` — rail graph model, track-cell access, and path finding.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                      |
//! |-----------|---------------------------------------------------------------|
//! | [`model`] | `NodeType`, `NodeMeta`, `RailNode`, `RailEdge`, `EdgeKey`     |
//! | [`graph`] | `RailGraph` snapshot, `RailGraphBuilder`, `GraphSignature`    |
//! | [`track`] | `TrackCells` host trait, `TrackGrid` in-memory implementation |
//! | [`path`]  | `PathFinder` trait, `RailPath`, `DijkstraPathFinder`          |
//! | [`error`] | `GraphError`, `GraphResult<T>`                                |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Batched path queries run on Rayon's thread pool.          |
//! | `serde`    | Derives `Serialize`/`Deserialize` on public model types.  |

pub mod error;
pub mod graph;
pub mod model;
pub mod path;
pub mod track;


pub use error::{GraphError, GraphResult};
pub use graph::{GraphSignature, RailGraph, RailGraphBuilder};
pub use model::{EdgeKey, EdgeMeta, NodeMeta, NodeType, RailEdge, RailNode};
pub use path::{shortest_paths, DijkstraPathFinder, Objective, PathFinder, PathOptions, RailPath};
pub use track::{TrackCells, TrackGrid};
