//! Build-subsystem error type.

use thiserror::Error;

use rd_core::{CoreError, RegionId};
use rd_graph::GraphError;

/// Errors produced by `rd-build`.
///
/// Stepped jobs never return these across `step`; they hand them to
/// [`BuildObserver::on_failure`](crate::BuildObserver::on_failure).  Only
/// registration, the CSV loader and the blocking build return them directly.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("a graph build for region {0} is already in progress")]
    AlreadyRunning(RegionId),

    #[error("no track cell under any seed for region {0}")]
    NoStartAnchor(RegionId),

    #[error("discovery found no nodes in region {0}")]
    NoNodes(RegionId),

    #[error(transparent)]
    Config(#[from] CoreError),

    #[error("graph assembly failed: {0}")]
    Graph(#[from] GraphError),

    #[error("marker parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BuildResult<T> = Result<T, BuildError>;
