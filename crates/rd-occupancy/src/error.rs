//! Occupancy error type.

use thiserror::Error;

use rd_graph::EdgeKey;

/// Errors produced by `rd-occupancy`.
///
/// Occupancy decisions are never errors; these only cover resolving
/// resources against a graph snapshot that does not match the request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OccupancyError {
    #[error("edge {0} is not part of the graph snapshot")]
    UnknownEdge(EdgeKey),
}

pub type OccupancyResult<T> = Result<T, OccupancyError>;
