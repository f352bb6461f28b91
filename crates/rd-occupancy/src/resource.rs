//! Claimable resources and how they are derived from a graph.

use std::collections::HashSet;
use std::fmt;

use rd_core::CellPos;
use rd_graph::{EdgeKey, RailEdge, RailGraph, RailPath};

use crate::error::{OccupancyError, OccupancyResult};

// ── OccupancyResource ─────────────────────────────────────────────────────────

/// What kind of unit a resource names.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceKind {
    /// A whole edge between two nodes.
    Edge,
    /// The branch point under a switcher.
    Junction,
    /// Any other logical resource a host wants arbitrated (crossings,
    /// platform tracks, level crossings).
    Custom,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Edge     => "edge",
            ResourceKind::Junction => "junction",
            ResourceKind::Custom   => "custom",
        }
    }
}

/// A `(kind, key)` pair naming one exclusively claimable unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccupancyResource {
    pub kind: ResourceKind,
    pub key:  String,
}

impl OccupancyResource {
    pub fn new(kind: ResourceKind, key: impl Into<String>) -> Self {
        Self { kind, key: key.into() }
    }

    /// The resource covering edge `key`; `a<->b` in canonical order.
    pub fn edge(key: &EdgeKey) -> Self {
        Self::new(ResourceKind::Edge, key.to_string())
    }

    /// The junction at `pos`.
    pub fn junction(pos: CellPos) -> Self {
        Self::new(ResourceKind::Junction, pos.to_string())
    }

    pub fn custom(key: impl Into<String>) -> Self {
        Self::new(ResourceKind::Custom, key)
    }
}

impl fmt::Display for OccupancyResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.key)
    }
}

// ── ResourceResolver ──────────────────────────────────────────────────────────

/// Maps graph elements to the resources a train must hold to use them.
pub trait ResourceResolver: Send + Sync {
    /// Resources for one edge of `graph`.
    fn resources_for_edge(&self, graph: &RailGraph, edge: &RailEdge) -> Vec<OccupancyResource>;

    /// Resources for every edge of `path`, de-duplicated, in travel order.
    ///
    /// Fails if the path names an edge that `graph` does not contain, which
    /// happens when the path was computed on an older snapshot.
    fn resources_for_path(
        &self,
        graph: &RailGraph,
        path: &RailPath,
    ) -> OccupancyResult<Vec<OccupancyResource>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for key in &path.edges {
            let edge = graph
                .edge_by_key(key)
                .ok_or_else(|| OccupancyError::UnknownEdge(key.clone()))?;
            for r in self.resources_for_edge(graph, edge) {
                if seen.insert(r.clone()) {
                    out.push(r);
                }
            }
        }
        Ok(out)
    }
}

/// Default resolver: every edge is a resource, and so is the junction under
/// each switcher endpoint.
///
/// Junctions are keyed by the switcher's position, so all edges leaving one
/// switcher contend for the same junction resource.
#[derive(Copy, Clone, Debug, Default)]
pub struct EdgeJunctionResolver;

impl ResourceResolver for EdgeJunctionResolver {
    fn resources_for_edge(&self, graph: &RailGraph, edge: &RailEdge) -> Vec<OccupancyResource> {
        let mut out = vec![OccupancyResource::edge(&edge.key())];
        for id in [&edge.from, &edge.to] {
            if let Some(node) = graph.node(id).filter(|n| n.is_switcher()) {
                out.push(OccupancyResource::junction(node.pos));
            }
        }
        out
    }
}
