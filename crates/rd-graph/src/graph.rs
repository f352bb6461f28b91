//! Immutable graph snapshot and its builder.
//!
//! # Data layout
//!
//! Nodes are stored in a `Vec` sorted by `NodeId` (the arena) with a hash
//! index from id to arena slot.  Edges live in a second `Vec`, and each node
//! slot keeps the list of incident edge slots:
//!
//! ```text
//! nodes[i]      — RailNode, ascending id
//! incident[i]   — indices into edges[] touching nodes[i]
//! edge_index    — EdgeKey → index into edges[]
//! ```
//!
//! Path finding runs over arena indices with plain `Vec` distance arrays, and
//! ascending-id slots make every index-based tie-break a `NodeId` tie-break.
//!
//! # Signature
//!
//! [`GraphSignature`] hashes only the node set: ids, roles, positions and
//! destination tags.  Two builds that discover the same markers produce the
//! same signature whatever order they were found in, which is how a rebuild
//! is recognised as a topology no-op.

use std::collections::HashMap;
use std::fmt;

use xxhash_rust::xxh64::Xxh64;

use rd_core::NodeId;

use crate::model::{EdgeKey, RailEdge, RailNode};
use crate::{GraphError, GraphResult, NodeType};

// ── GraphSignature ────────────────────────────────────────────────────────────

/// Stable content hash of a node set.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphSignature(pub u64);

impl GraphSignature {
    /// Hash a node set, independent of iteration order.
    pub fn of_nodes<'a>(nodes: impl IntoIterator<Item = &'a RailNode>) -> Self {
        let mut sorted: Vec<&RailNode> = nodes.into_iter().collect();
        sorted.sort_by(|a, b| a.id().cmp(b.id()));
        sorted.dedup_by(|a, b| a.id() == b.id());

        let mut h = Xxh64::new(0);
        for node in sorted {
            h.update(node.id().as_str().as_bytes());
            h.update(&[0x1f]);
            h.update(node.node_type.as_str().as_bytes());
            h.update(&node.pos.x.to_le_bytes());
            h.update(&node.pos.y.to_le_bytes());
            h.update(&node.pos.z.to_le_bytes());
            if let Some(dest) = &node.destination {
                h.update(dest.as_bytes());
            }
            h.update(&[0x1e]);
        }
        GraphSignature(h.digest())
    }
}

impl fmt::Display for GraphSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// ── RailGraph ─────────────────────────────────────────────────────────────────

/// A finished, immutable graph snapshot for one region.
///
/// Do not construct directly; use [`RailGraphBuilder`].  Consumers share a
/// snapshot behind an `Arc`; a rebuild replaces it wholesale.
#[derive(Debug, Clone)]
pub struct RailGraph {
    nodes:      Vec<RailNode>,
    node_index: HashMap<NodeId, usize>,
    edges:      Vec<RailEdge>,
    edge_index: HashMap<EdgeKey, usize>,
    incident:   Vec<Vec<usize>>,
    signature:  GraphSignature,
}

impl RailGraph {
    /// A graph with no nodes or edges.
    pub fn empty() -> Self {
        RailGraphBuilder::new().build()
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn signature(&self) -> GraphSignature {
        self.signature
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn node(&self, id: &NodeId) -> Option<&RailNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    /// All nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &RailNode> + '_ {
        self.nodes.iter()
    }

    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &RailNode> + '_ {
        self.nodes.iter().filter(move |n| n.node_type == node_type)
    }

    /// The edge between `a` and `b`, in either direction.
    pub fn edge(&self, a: &NodeId, b: &NodeId) -> Option<&RailEdge> {
        self.edge_by_key(&EdgeKey::new(a.clone(), b.clone()))
    }

    pub fn edge_by_key(&self, key: &EdgeKey) -> Option<&RailEdge> {
        self.edge_index.get(key).map(|&i| &self.edges[i])
    }

    pub fn edges(&self) -> impl Iterator<Item = &RailEdge> + '_ {
        self.edges.iter()
    }

    /// Every edge incident to `node`, whatever its direction.
    pub fn edges_of<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a RailEdge> + 'a {
        let slots: &[usize] = self
            .node_index
            .get(node)
            .map(|&i| self.incident[i].as_slice())
            .unwrap_or(&[]);
        slots.iter().map(move |&e| &self.edges[e])
    }

    /// Nodes reachable from `node` over one edge, respecting one-way edges.
    pub fn neighbors<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a NodeId> + 'a {
        self.edges_of(node).filter_map(move |e| e.target_from(node))
    }

    // ── Index-level access for path finding ───────────────────────────────

    pub(crate) fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub(crate) fn node_at(&self, idx: usize) -> &RailNode {
        &self.nodes[idx]
    }

    pub(crate) fn edge_at(&self, idx: usize) -> &RailEdge {
        &self.edges[idx]
    }

    pub(crate) fn incident_at(&self, idx: usize) -> &[usize] {
        &self.incident[idx]
    }
}

// ── RailGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`RailGraph`] incrementally, then call [`build`](Self::build).
///
/// Nodes and edges may be added in any order, but an edge's endpoints must
/// already be present.  Adding a second edge for the same unordered pair
/// keeps the shorter one.
///
/// # Example
///
/// ```
/// use rd_core::CellPos;
/// use rd_graph::{NodeType, RailEdge, RailGraphBuilder, RailNode};
///
/// let mut b = RailGraphBuilder::new();
/// b.add_node(RailNode::new("A", NodeType::Station, CellPos::new(0, 64, 0)));
/// b.add_node(RailNode::new("B", NodeType::Depot, CellPos::new(40, 64, 0)));
/// b.add_edge(RailEdge::new("A", "B", 40, 8.0)).unwrap();
/// let graph = b.build();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 1);
/// ```
#[derive(Default)]
pub struct RailGraphBuilder {
    nodes: HashMap<NodeId, RailNode>,
    edges: HashMap<EdgeKey, RailEdge>,
}

impl RailGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node.  Returns the node it replaced, if any.
    pub fn add_node(&mut self, node: RailNode) -> Option<RailNode> {
        self.nodes.insert(node.id().clone(), node)
    }

    /// Add an edge between two known nodes.
    pub fn add_edge(&mut self, edge: RailEdge) -> GraphResult<()> {
        if edge.from == edge.to {
            return Err(GraphError::SelfLoop(edge.from));
        }
        if !self.nodes.contains_key(&edge.from) || !self.nodes.contains_key(&edge.to) {
            return Err(GraphError::UnknownEndpoint { from: edge.from, to: edge.to });
        }
        let key = edge.key();
        match self.edges.get(&key) {
            Some(existing) if existing.length <= edge.length => {}
            _ => {
                self.edges.insert(key, edge);
            }
        }
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Consume the builder and produce a [`RailGraph`].
    ///
    /// Time complexity: O(N log N + E log E) for the id sorts.
    pub fn build(self) -> RailGraph {
        let signature = GraphSignature::of_nodes(self.nodes.values());

        let mut nodes: Vec<RailNode> = self.nodes.into_values().collect();
        nodes.sort_by(|a, b| a.id().cmp(b.id()));
        let node_index: HashMap<NodeId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id().clone(), i))
            .collect();

        // Sorted edge order keeps incident lists deterministic.
        let mut keyed: Vec<(EdgeKey, RailEdge)> = self.edges.into_iter().collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut incident = vec![Vec::new(); nodes.len()];
        let mut edge_index = HashMap::with_capacity(keyed.len());
        let mut edges = Vec::with_capacity(keyed.len());
        for (slot, (key, edge)) in keyed.into_iter().enumerate() {
            incident[node_index[&edge.from]].push(slot);
            incident[node_index[&edge.to]].push(slot);
            edge_index.insert(key, slot);
            edges.push(edge);
        }

        RailGraph { nodes, node_index, edges, edge_index, incident, signature }
    }
}
