//! Graph Snapshot Store: the latest published graph per region.
//!
//! Snapshots are immutable and shared as `Arc<RailGraph>`.  Publishing a new
//! build replaces the region's entry wholesale; readers holding the previous
//! `Arc` keep a consistent view until they drop it.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use rd_build::{BuildOutput, DiscoveryReport};
use rd_core::{CellPos, RegionId, Timestamp};
use rd_graph::{GraphSignature, RailGraph};

/// Summary of one published build.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildReport {
    pub region:            RegionId,
    pub built_at:          Timestamp,
    pub nodes:             usize,
    pub edges:             usize,
    pub signature:         GraphSignature,
    /// `false` when the previous snapshot had the same signature.
    pub changed:           bool,
    pub missing_switchers: Vec<CellPos>,
    pub discovery:         DiscoveryReport,
    pub processed_steps:   usize,
}

#[derive(Clone, Debug)]
struct Entry {
    graph:  Arc<RailGraph>,
    report: BuildReport,
}

/// Region → latest graph snapshot.
#[derive(Debug, Default)]
pub struct GraphCatalog {
    entries: RwLock<BTreeMap<RegionId, Entry>>,
}

impl GraphCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a finished build as the region's current snapshot.
    pub fn publish(&self, output: BuildOutput, built_at: Timestamp) -> BuildReport {
        let BuildOutput { region, graph, missing_switchers, discovery, processed_steps } = output;
        let mut entries = self.entries.write();
        let changed = entries
            .get(&region)
            .is_none_or(|prev| prev.report.signature != graph.signature());
        let report = BuildReport {
            region: region.clone(),
            built_at,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            signature: graph.signature(),
            changed,
            missing_switchers,
            discovery,
            processed_steps,
        };
        entries.insert(region, Entry { graph: Arc::new(graph), report: report.clone() });
        report
    }

    pub fn graph(&self, region: &RegionId) -> Option<Arc<RailGraph>> {
        self.entries.read().get(region).map(|e| Arc::clone(&e.graph))
    }

    pub fn report(&self, region: &RegionId) -> Option<BuildReport> {
        self.entries.read().get(region).map(|e| e.report.clone())
    }

    /// Regions with a published snapshot, sorted.
    pub fn regions(&self) -> Vec<RegionId> {
        self.entries.read().keys().cloned().collect()
    }

    /// Forget a region's snapshot.  Returns `true` if there was one.
    pub fn remove(&self, region: &RegionId) -> bool {
        self.entries.write().remove(region).is_some()
    }
}
