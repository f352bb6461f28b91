//! Shortest-path queries over a graph snapshot.
//!
//! # Pluggability
//!
//! Consumers call path finding through the [`PathFinder`] trait, so a host
//! can swap in A* or a congestion-aware model without touching the build or
//! occupancy crates.  The default [`DijkstraPathFinder`] is sufficient for
//! networks of a few thousand nodes.
//!
//! # Statelessness
//!
//! A query is a pure function of `(graph, from, to, options)`.  Nothing is
//! cached on the finder or the graph, so any number of threads may query the
//! same `Arc<RailGraph>` at once.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use rd_core::NodeId;

use crate::graph::RailGraph;
use crate::model::{EdgeKey, RailEdge};

// ── Options ───────────────────────────────────────────────────────────────────

/// What a path query minimises.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Objective {
    /// Total edge length in track cells.
    #[default]
    Length,
    /// Total travel time at each edge's speed limit, in milliseconds.
    TravelTime,
}

impl Objective {
    #[inline]
    fn cost(self, edge: &RailEdge) -> u64 {
        match self {
            Objective::Length     => edge.length as u64,
            Objective::TravelTime => edge.travel_time_ms(),
        }
    }
}

/// Per-query options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathOptions {
    pub objective: Objective,
    /// Nodes the path must not pass through.  The endpoints are exempt.
    pub avoid: BTreeSet<NodeId>,
}

impl PathOptions {
    pub fn objective(objective: Objective) -> Self {
        Self { objective, avoid: BTreeSet::new() }
    }

    pub fn avoiding(mut self, node: impl Into<NodeId>) -> Self {
        self.avoid.insert(node.into());
        self
    }
}

// ── RailPath ──────────────────────────────────────────────────────────────────

/// The result of a path query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RailPath {
    /// Nodes in travel order, including both endpoints.
    pub nodes: Vec<NodeId>,
    /// Edges in travel order; `edges.len() == nodes.len() - 1`.
    pub edges: Vec<EdgeKey>,
    /// Sum of edge lengths, in track cells.
    pub total_length: u64,
    /// Sum of costs under the query's objective.
    pub cost: u64,
}

impl RailPath {
    /// `true` if the source and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }
}

// ── PathFinder trait ──────────────────────────────────────────────────────────

/// Pluggable path-finding engine.
///
/// Implementations must be `Send + Sync` so they can be shared between the
/// dispatch threads querying a snapshot.
pub trait PathFinder: Send + Sync {
    /// Shortest path from `from` to `to`.
    ///
    /// Returns `None` if either endpoint is unknown or `to` is unreachable.
    /// `from == to` yields a trivial one-node path.
    fn shortest_path(
        &self,
        graph: &RailGraph,
        from: &NodeId,
        to: &NodeId,
        options: &PathOptions,
    ) -> Option<RailPath>;
}

// ── DijkstraPathFinder ────────────────────────────────────────────────────────

/// Standard Dijkstra over the snapshot's node arena.
///
/// Ties between equal-cost frontier entries resolve to the lower `NodeId`,
/// so the same query always returns the same path.
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraPathFinder;

impl PathFinder for DijkstraPathFinder {
    fn shortest_path(
        &self,
        graph: &RailGraph,
        from: &NodeId,
        to: &NodeId,
        options: &PathOptions,
    ) -> Option<RailPath> {
        dijkstra(graph, from, to, options)
    }
}

/// Sentinel for "no predecessor edge".
const NO_EDGE: usize = usize::MAX;

fn dijkstra(graph: &RailGraph, from: &NodeId, to: &NodeId, options: &PathOptions) -> Option<RailPath> {
    let src = graph.index_of(from)?;
    let dst = graph.index_of(to)?;

    if src == dst {
        return Some(RailPath {
            nodes: vec![from.clone()],
            edges: vec![],
            total_length: 0,
            cost: 0,
        });
    }

    let n = graph.node_count();
    // dist[v] = best known cost to reach v.
    let mut dist = vec![u64::MAX; n];
    // prev_edge[v] = edge slot that reached v.
    let mut prev_edge = vec![NO_EDGE; n];
    // prev_node[v] = arena slot the edge was entered from.
    let mut prev_node = vec![usize::MAX; n];

    dist[src] = 0;

    // Min-heap: (cost, node slot).  Arena slots ascend with NodeId.
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();
    heap.push(Reverse((0, src)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == dst {
            return Some(reconstruct(graph, &prev_edge, &prev_node, dst, cost));
        }

        // Skip stale heap entries.
        if cost > dist[node] {
            continue;
        }

        let node_id = graph.node_at(node).id();
        for &slot in graph.incident_at(node) {
            let edge = graph.edge_at(slot);
            let Some(target) = edge.target_from(node_id) else {
                continue;
            };
            if target != to && options.avoid.contains(target) {
                continue;
            }
            let Some(next) = graph.index_of(target) else {
                continue;
            };

            let new_cost = cost.saturating_add(options.objective.cost(edge));
            if new_cost < dist[next] {
                dist[next] = new_cost;
                prev_edge[next] = slot;
                prev_node[next] = node;
                heap.push(Reverse((new_cost, next)));
            }
        }
    }

    None
}

fn reconstruct(
    graph: &RailGraph,
    prev_edge: &[usize],
    prev_node: &[usize],
    dst: usize,
    cost: u64,
) -> RailPath {
    let mut nodes = vec![graph.node_at(dst).id().clone()];
    let mut edges = Vec::new();
    let mut total_length = 0u64;
    let mut cur = dst;
    while prev_edge[cur] != NO_EDGE {
        let edge = graph.edge_at(prev_edge[cur]);
        total_length += edge.length as u64;
        edges.push(edge.key());
        cur = prev_node[cur];
        nodes.push(graph.node_at(cur).id().clone());
    }
    nodes.reverse();
    edges.reverse();
    RailPath { nodes, edges, total_length, cost }
}

// ── Batch queries ─────────────────────────────────────────────────────────────

/// Run many independent queries against one snapshot.
///
/// Results are returned in the order of `pairs`.  With the `parallel` Cargo
/// feature the queries run on Rayon's thread pool.
pub fn shortest_paths<P: PathFinder>(
    finder: &P,
    graph: &RailGraph,
    pairs: &[(NodeId, NodeId)],
    options: &PathOptions,
) -> Vec<Option<RailPath>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        pairs
            .par_iter()
            .map(|(from, to)| finder.shortest_path(graph, from, to, options))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        pairs
            .iter()
            .map(|(from, to)| finder.shortest_path(graph, from, to, options))
            .collect()
    }
}
