//! Query façade over the catalog: paths, lookups, diagnostics and occupancy.
//!
//! Every query reads the region's current snapshot once, so a rebuild that
//! lands mid-query never mixes two graphs in one answer.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use rd_core::{CellPos, DispatchConfig, HolderId, NodeId, OccupancyConfig, RegionId, Timestamp};
use rd_graph::{DijkstraPathFinder, PathFinder, PathOptions, RailEdge, RailNode, RailPath};
use rd_occupancy::{
    EdgeJunctionResolver, OccupancyDecision, OccupancyManager, OccupancyRequest,
    OccupancyResource, ResourceResolver,
};

use crate::catalog::GraphCatalog;
use crate::{DispatchError, DispatchResult};

/// Region-aware query entry point for schedulers and UIs.
pub struct Dispatcher<P = DijkstraPathFinder, R = EdgeJunctionResolver> {
    catalog:   Arc<GraphCatalog>,
    finder:    P,
    resolver:  R,
    occupancy: RwLock<BTreeMap<RegionId, Arc<OccupancyManager>>>,
    config:    OccupancyConfig,
}

impl Dispatcher {
    /// Dijkstra path finder and the edge/junction resolver.
    pub fn new(catalog: Arc<GraphCatalog>, config: &DispatchConfig) -> Self {
        Self::with_parts(catalog, DijkstraPathFinder, EdgeJunctionResolver, config)
    }
}

impl<P: PathFinder, R: ResourceResolver> Dispatcher<P, R> {
    pub fn with_parts(catalog: Arc<GraphCatalog>, finder: P, resolver: R, config: &DispatchConfig) -> Self {
        Self {
            catalog,
            finder,
            resolver,
            occupancy: RwLock::new(BTreeMap::new()),
            config: config.occupancy.clone(),
        }
    }

    pub fn catalog(&self) -> &Arc<GraphCatalog> {
        &self.catalog
    }

    /// Shortest path in `region`'s current snapshot.  `None` if the region
    /// has no snapshot, an endpoint is unknown, or `to` is unreachable.
    pub fn shortest_path(
        &self,
        region: &RegionId,
        from: &NodeId,
        to: &NodeId,
        options: &PathOptions,
    ) -> Option<RailPath> {
        let graph = self.catalog.graph(region)?;
        self.finder.shortest_path(&graph, from, to, options)
    }

    pub fn node(&self, region: &RegionId, id: &NodeId) -> Option<RailNode> {
        self.catalog.graph(region)?.node(id).cloned()
    }

    pub fn edge(&self, region: &RegionId, a: &NodeId, b: &NodeId) -> Option<RailEdge> {
        self.catalog.graph(region)?.edge(a, b).cloned()
    }

    /// Missing-switcher diagnostics from the region's latest build.
    pub fn missing_switchers(&self, region: &RegionId) -> Vec<CellPos> {
        self.catalog
            .report(region)
            .map(|r| r.missing_switchers)
            .unwrap_or_default()
    }

    /// The region's occupancy ledger, created on first use.  The ledger
    /// outlives graph rebuilds.
    pub fn occupancy(&self, region: &RegionId) -> Arc<OccupancyManager> {
        if let Some(m) = self.occupancy.read().get(region) {
            return Arc::clone(m);
        }
        let mut map = self.occupancy.write();
        Arc::clone(
            map.entry(region.clone())
                .or_insert_with(|| Arc::new(OccupancyManager::new(self.config.clone()))),
        )
    }

    /// Resources a train must hold to run `path` in `region`.
    pub fn resources_for_path(
        &self,
        region: &RegionId,
        path: &RailPath,
    ) -> DispatchResult<Vec<OccupancyResource>> {
        let graph = self
            .catalog
            .graph(region)
            .ok_or_else(|| DispatchError::UnknownRegion(region.clone()))?;
        Ok(self.resolver.resources_for_path(&graph, path)?)
    }

    /// Resolve `path` and try to claim all of it for `holder` at `now`.
    pub fn reserve_path(
        &self,
        region: &RegionId,
        holder: &HolderId,
        path: &RailPath,
        now: Timestamp,
    ) -> DispatchResult<OccupancyDecision> {
        let resources = self.resources_for_path(region, path)?;
        let request = OccupancyRequest::new(holder.clone(), now, resources);
        Ok(self.occupancy(region).acquire(&request))
    }
}
