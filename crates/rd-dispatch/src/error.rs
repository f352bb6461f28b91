//! Error types for rd-dispatch.

use thiserror::Error;

use rd_build::BuildError;
use rd_core::RegionId;
use rd_occupancy::OccupancyError;

/// Errors surfaced by the build driver, catalog queries and snapshot sinks.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Occupancy(#[from] OccupancyError),

    #[error("no graph has been published for region {0}")]
    UnknownRegion(RegionId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

/// Alias for `Result<T, DispatchError>`.
pub type DispatchResult<T> = Result<T, DispatchError>;
