//! Marker Configuration Scanner interface.
//!
//! In-world signage is parsed by the host; what reaches the build is a stream
//! of [`NodeDefinition`]s per region.  [`MarkerSource`] pages through that
//! stream so a full scan can be spread over many build steps.

use std::collections::HashMap;

use rd_core::{CellPos, NodeId, RegionId};
use rd_graph::{NodeMeta, NodeType, RailNode};

/// A raw node declaration as produced by the host's marker scanner.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDefinition {
    pub id: NodeId,
    pub node_type: NodeType,
    pub pos: CellPos,
    pub destination: Option<String>,
    pub meta: Option<NodeMeta>,
}

impl NodeDefinition {
    pub fn new(id: impl Into<NodeId>, node_type: NodeType, pos: CellPos) -> Self {
        Self { id: id.into(), node_type, pos, destination: None, meta: None }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_meta(mut self, meta: NodeMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn to_node(&self) -> RailNode {
        let mut node = RailNode::new(self.id.clone(), self.node_type, self.pos);
        node.destination = self.destination.clone();
        if let Some(meta) = &self.meta {
            node = node.with_meta(meta.clone());
        }
        node
    }
}

/// Source of marker definitions, supplied by the host environment.
pub trait MarkerSource {
    /// Up to `limit` definitions of `region`, starting at `offset` in the
    /// source's scan order.  A page shorter than `limit` ends the scan.
    fn scan(&self, region: &RegionId, offset: usize, limit: usize) -> Vec<NodeDefinition>;
}

impl<S: MarkerSource + ?Sized> MarkerSource for &S {
    fn scan(&self, region: &RegionId, offset: usize, limit: usize) -> Vec<NodeDefinition> {
        (**self).scan(region, offset, limit)
    }
}

/// In-memory marker source keyed by region.
#[derive(Clone, Debug, Default)]
pub struct MarkerTable {
    regions: HashMap<RegionId, Vec<NodeDefinition>>,
}

impl MarkerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, region: RegionId, def: NodeDefinition) {
        self.regions.entry(region).or_default().push(def);
    }

    pub fn extend(&mut self, region: RegionId, defs: impl IntoIterator<Item = NodeDefinition>) {
        self.regions.entry(region).or_default().extend(defs);
    }

    /// All definitions of `region`, in scan order.
    pub fn markers(&self, region: &RegionId) -> &[NodeDefinition] {
        self.regions.get(region).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Total definitions across all regions.
    pub fn len(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MarkerSource for MarkerTable {
    fn scan(&self, region: &RegionId, offset: usize, limit: usize) -> Vec<NodeDefinition> {
        self.markers(region)
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }
}
