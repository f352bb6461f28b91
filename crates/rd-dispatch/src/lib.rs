//! `rd-dispatch` — region-level orchestration on top of the build and
//! occupancy crates.
//!
//! # What lives here
//!
//! | Module         | Contents                                                |
//! |----------------|---------------------------------------------------------|
//! | [`catalog`]    | `GraphCatalog` snapshot store, `BuildReport`            |
//! | [`driver`]     | `BuildDriver` (start / status / cancel / tick), `BuildEvent` |
//! | [`dispatcher`] | `Dispatcher` query façade: paths, lookups, occupancy    |
//! | [`sink`]       | `SnapshotSink` persistence hook, `CsvSnapshotSink`      |
//! | [`error`]      | `DispatchError`, `DispatchResult<T>`                    |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Forwards to `rd-graph/parallel`.                        |
//! | `serde`    | Forwards serde derives to every `rd-*` crate.           |

pub mod catalog;
pub mod dispatcher;
pub mod driver;
pub mod error;
pub mod sink;


pub use catalog::{BuildReport, GraphCatalog};
pub use dispatcher::Dispatcher;
pub use driver::{BuildDriver, BuildEvent};
pub use error::{DispatchError, DispatchResult};
pub use sink::{CsvSnapshotSink, SnapshotSink};
