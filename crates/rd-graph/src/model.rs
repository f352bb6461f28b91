//! Graph value types: nodes, edges, and their metadata.
//!
//! Edges never hold node handles, only `NodeId`s.  A [`RailGraph`] resolves
//! ids through its own index, so snapshots can be shared behind an `Arc`
//! without ownership cycles.
//!
//! [`RailGraph`]: crate::RailGraph

use std::fmt;
use std::str::FromStr;

use rd_core::{CellPos, NodeId};

use crate::GraphError;

// ── NodeType ──────────────────────────────────────────────────────────────────

/// Role of a topology node.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NodeType {
    Waypoint,
    Station,
    Depot,
    /// Track branch point that requires explicit routing configuration.
    Switcher,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Waypoint => "waypoint",
            NodeType::Station  => "station",
            NodeType::Depot    => "depot",
            NodeType::Switcher => "switcher",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "waypoint" => Ok(NodeType::Waypoint),
            "station"  => Ok(NodeType::Station),
            "depot"    => Ok(NodeType::Depot),
            "switcher" => Ok(NodeType::Switcher),
            other      => Err(GraphError::UnknownNodeType(other.to_owned())),
        }
    }
}

// ── NodeMeta ──────────────────────────────────────────────────────────────────

/// Structured metadata declared on a station or depot marker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeMeta {
    /// Operator (company) code.
    pub operator: Option<String>,
    /// Station or depot display name.
    pub name: Option<String>,
    /// Platform or depot track index.
    pub platform: Option<u16>,
}

impl NodeMeta {
    pub fn is_empty(&self) -> bool {
        self.operator.is_none() && self.name.is_none() && self.platform.is_none()
    }
}

// ── RailNode ──────────────────────────────────────────────────────────────────

/// A topology node.  The id is fixed at construction; `pos` is the anchor
/// used for track snapping and resource resolution.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RailNode {
    id: NodeId,
    pub node_type: NodeType,
    pub pos: CellPos,
    /// External destination tag (e.g. the network a switcher routes to).
    pub destination: Option<String>,
    pub meta: Option<NodeMeta>,
}

impl RailNode {
    pub fn new(id: impl Into<NodeId>, node_type: NodeType, pos: CellPos) -> Self {
        Self { id: id.into(), node_type, pos, destination: None, meta: None }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_meta(mut self, meta: NodeMeta) -> Self {
        self.meta = (!meta.is_empty()).then_some(meta);
        self
    }

    #[inline]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    #[inline]
    pub fn is_switcher(&self) -> bool {
        self.node_type == NodeType::Switcher
    }

    /// A switcher without a destination tag is a placeholder that any
    /// tagged definition of the same id replaces.
    #[inline]
    pub fn is_provisional(&self) -> bool {
        self.is_switcher() && self.destination.is_none()
    }
}

// ── EdgeKey ───────────────────────────────────────────────────────────────────

/// Unordered pair of node ids identifying an edge.  Stored canonically with
/// `a <= b`, so `EdgeKey::new(x, y) == EdgeKey::new(y, x)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeKey {
    a: NodeId,
    b: NodeId,
}

impl EdgeKey {
    pub fn new(x: NodeId, y: NodeId) -> Self {
        if x <= y { Self { a: x, b: y } } else { Self { a: y, b: x } }
    }

    #[inline]
    pub fn a(&self) -> &NodeId {
        &self.a
    }

    #[inline]
    pub fn b(&self) -> &NodeId {
        &self.b
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        &self.a == node || &self.b == node
    }

    /// The endpoint opposite `node`, or `None` if `node` is not an endpoint.
    pub fn other(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.a == node {
            Some(&self.b)
        } else if &self.b == node {
            Some(&self.a)
        } else {
            None
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<->{}", self.a, self.b)
    }
}

// ── RailEdge ──────────────────────────────────────────────────────────────────

/// Endpoint metadata copied onto an edge at build time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeMeta {
    pub from: Option<NodeMeta>,
    pub to:   Option<NodeMeta>,
}

/// A direct connection between two nodes.
///
/// `length` is counted in track-cell steps and is a single shared value for
/// both directions of a bidirectional edge.  A one-way edge may only be
/// traversed `from → to`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RailEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub length: u32,
    /// Base speed limit in cells per second.
    pub speed_limit: f32,
    pub bidirectional: bool,
    pub meta: Option<EdgeMeta>,
}

impl RailEdge {
    /// A bidirectional edge with no metadata.
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>, length: u32, speed_limit: f32) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            length,
            speed_limit,
            bidirectional: true,
            meta: None,
        }
    }

    pub fn one_way(mut self) -> Self {
        self.bidirectional = false;
        self
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.from.clone(), self.to.clone())
    }

    /// `true` if the edge may be traversed starting at `node`.
    pub fn can_leave(&self, node: &NodeId) -> bool {
        &self.from == node || (self.bidirectional && &self.to == node)
    }

    /// The endpoint reached when leaving `node` along this edge.
    pub fn target_from(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.from == node {
            Some(&self.to)
        } else if self.bidirectional && &self.to == node {
            Some(&self.from)
        } else {
            None
        }
    }

    /// Travel time at the speed limit, in milliseconds (rounded up).
    /// A non-positive limit falls back to one cell per second.
    pub fn travel_time_ms(&self) -> u64 {
        let speed = if self.speed_limit > 0.0 { self.speed_limit as f64 } else { 1.0 };
        (self.length as f64 * 1_000.0 / speed).ceil() as u64
    }
}
