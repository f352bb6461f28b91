//! Graph-subsystem error type.

use thiserror::Error;

use rd_core::NodeId;

/// Errors produced by `rd-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("edge {from} -> {to} references a node missing from the graph")]
    UnknownEndpoint { from: NodeId, to: NodeId },

    #[error("edge {0} -> {0} is a self-loop")]
    SelfLoop(NodeId),

    #[error("unknown node type {0:?}: expected waypoint, station, depot or switcher")]
    UnknownNodeType(String),
}

pub type GraphResult<T> = Result<T, GraphError>;
