//! Topology discovery: produce the candidate node set for a region.
//!
//! # Modes
//!
//! - **Full** ([`FullScan`]): page through every marker of the region,
//!   de-duplicate by node id, then snap each node onto track.
//! - **Local** ([`LocalTrace`]): pick seed track cells, flood the connected
//!   track component from them, and keep only the known nodes anchored inside
//!   that component.  Physically disconnected markers never leak in.
//!
//! Both are [`IncrementalSession`]s.  One unit of work is one marker merged,
//! one node anchored, or one track cell dequeued.
//!
//! # De-duplication
//!
//! When two markers resolve to the same id, a definition carrying a
//! destination tag replaces one without; otherwise the first one scanned
//! stays.  Every collision is recorded as a [`NodeConflict`].

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use rd_core::{BuildConfig, CellPos, NodeId, RegionId, StepBudget};
use rd_graph::{NodeType, RailNode, TrackCells};

use crate::marker::{MarkerSource, NodeDefinition};
use crate::session::IncrementalSession;

/// Markers requested from the source per page.
const SCAN_PAGE: usize = 256;

// ── Outcome types ─────────────────────────────────────────────────────────────

/// A discovered node together with the track cells it anchors to.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchoredNode {
    pub node: RailNode,
    /// Nearest track cells to the node's position; empty if none in range.
    pub anchors: Vec<CellPos>,
}

/// Two markers that resolved to the same node id.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeConflict {
    pub id: NodeId,
    pub kept: NodeDefinition,
    pub dropped: NodeDefinition,
}

/// Where a local build's seed cells came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeedOrigin {
    /// Cells selected with the external seed tool.
    Tool,
    /// Anchor cells of the marker nearest the requester.
    NearestMarker(NodeId),
    /// Track under the requester's own position.
    Requester,
}

/// Checked, non-fatal findings of a discovery pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiscoveryReport {
    pub markers_scanned: usize,
    pub conflicts: Vec<NodeConflict>,
    /// Definitions rejected outright (empty id).
    pub invalid: usize,
    /// Full mode: nodes kept although no track lies within the anchor radius.
    pub unanchored: usize,
    /// Local mode: known nodes left out because they lie outside the component.
    pub disconnected: usize,
    pub seed_origin: Option<SeedOrigin>,
}

/// Result of a finished discovery session.
#[derive(Clone, Debug, PartialEq)]
pub enum DiscoveryOutcome {
    Nodes {
        nodes: Vec<AnchoredNode>,
        report: DiscoveryReport,
    },
    /// Local mode found no track cell under any seed.
    NoStartAnchor { report: DiscoveryReport },
}

/// Seed inputs for a local build, in priority order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeedSelection {
    /// Track cells chosen with the external seed tool.
    pub tool_cells: Vec<CellPos>,
    /// Nodes pre-seeded by the tool; merged before the region's markers.
    pub tool_nodes: Vec<NodeDefinition>,
    /// The requester's current position.
    pub requester: Option<CellPos>,
}

impl SeedSelection {
    pub fn from_cells(cells: impl IntoIterator<Item = CellPos>) -> Self {
        Self { tool_cells: cells.into_iter().collect(), ..Self::default() }
    }

    pub fn from_requester(pos: CellPos) -> Self {
        Self { requester: Some(pos), ..Self::default() }
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Merge `def` into `known`, applying the destination-tag precedence rule.
fn merge_definition(
    known: &mut BTreeMap<NodeId, NodeDefinition>,
    def: NodeDefinition,
    report: &mut DiscoveryReport,
) {
    report.markers_scanned += 1;
    if def.id.is_empty() {
        report.invalid += 1;
        return;
    }
    let Some(existing) = known.get_mut(&def.id) else {
        known.insert(def.id.clone(), def);
        return;
    };
    if *existing == def {
        return;
    }
    let id = def.id.clone();
    if existing.destination.is_none() && def.destination.is_some() {
        let dropped = std::mem::replace(existing, def);
        report.conflicts.push(NodeConflict { id, kept: existing.clone(), dropped });
    } else {
        report.conflicts.push(NodeConflict { id, kept: existing.clone(), dropped: def });
    }
}

/// Buffered, paged reader over a region's markers.
struct MarkerCursor {
    offset: usize,
    buffer: VecDeque<NodeDefinition>,
    exhausted: bool,
}

impl MarkerCursor {
    fn new() -> Self {
        Self { offset: 0, buffer: VecDeque::new(), exhausted: false }
    }

    fn next<M: MarkerSource>(&mut self, source: &M, region: &RegionId) -> Option<NodeDefinition> {
        if self.buffer.is_empty() && !self.exhausted {
            let page = source.scan(region, self.offset, SCAN_PAGE);
            self.exhausted = page.len() < SCAN_PAGE;
            self.offset += page.len();
            self.buffer.extend(page);
        }
        self.buffer.pop_front()
    }

    fn is_done(&self) -> bool {
        self.exhausted && self.buffer.is_empty()
    }
}

// ── FullScan ──────────────────────────────────────────────────────────────────

/// Full-mode discovery over every marker in a region.
pub struct FullScan<T, M> {
    region:        RegionId,
    track:         Arc<T>,
    markers:       Arc<M>,
    anchor_radius: u32,
    cursor:        MarkerCursor,
    known:         BTreeMap<NodeId, NodeDefinition>,
    pending:       VecDeque<NodeDefinition>,
    anchored:      Vec<AnchoredNode>,
    report:        DiscoveryReport,
    anchoring:     bool,
}

impl<T: TrackCells, M: MarkerSource> FullScan<T, M> {
    pub fn new(region: RegionId, track: Arc<T>, markers: Arc<M>, config: &BuildConfig) -> Self {
        Self {
            region,
            track,
            markers,
            anchor_radius: config.anchor_radius,
            cursor: MarkerCursor::new(),
            known: BTreeMap::new(),
            pending: VecDeque::new(),
            anchored: Vec::new(),
            report: DiscoveryReport::default(),
            anchoring: false,
        }
    }

    pub fn nodes_found(&self) -> usize {
        self.known.len() + self.pending.len() + self.anchored.len()
    }

    pub fn queue_len(&self) -> usize {
        self.cursor.buffer.len() + self.pending.len()
    }

    /// The discovered nodes.  Meaningful once [`is_done`](IncrementalSession::is_done).
    pub fn finish(self) -> DiscoveryOutcome {
        DiscoveryOutcome::Nodes { nodes: self.anchored, report: self.report }
    }
}

impl<T: TrackCells, M: MarkerSource> IncrementalSession for FullScan<T, M> {
    fn is_done(&self) -> bool {
        self.anchoring && self.pending.is_empty()
    }

    fn step(&mut self, budget: StepBudget) -> usize {
        let mut used = 0;
        while budget.allows(used) && !self.is_done() {
            used += 1;
            if !self.anchoring {
                match self.cursor.next(self.markers.as_ref(), &self.region) {
                    Some(def) => merge_definition(&mut self.known, def, &mut self.report),
                    None => {
                        debug_assert!(self.cursor.is_done());
                        self.pending = std::mem::take(&mut self.known).into_values().collect();
                        self.anchoring = true;
                    }
                }
                continue;
            }

            if let Some(def) = self.pending.pop_front() {
                let anchors = self.track.find_nearest_track_cells(def.pos, self.anchor_radius);
                if anchors.is_empty() {
                    self.report.unanchored += 1;
                }
                self.anchored.push(AnchoredNode { node: def.to_node(), anchors });
            }
        }
        used
    }
}

// ── LocalTrace ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LocalPhase {
    Collecting,
    Seeding,
    Tracing,
    Filtering,
    Done,
}

/// Local-mode discovery: flood the track component around the seeds.
pub struct LocalTrace<T, M> {
    region:        RegionId,
    track:         Arc<T>,
    markers:       Arc<M>,
    anchor_radius: u32,
    seed_radius:   u32,
    seeds:         SeedSelection,
    phase:         LocalPhase,
    cursor:        MarkerCursor,
    known:         BTreeMap<NodeId, NodeDefinition>,
    visited:       FxHashSet<CellPos>,
    queue:         VecDeque<CellPos>,
    pending:       VecDeque<NodeDefinition>,
    retained:      Vec<AnchoredNode>,
    report:        DiscoveryReport,
    no_anchor:     bool,
}

impl<T: TrackCells, M: MarkerSource> LocalTrace<T, M> {
    pub fn new(
        region: RegionId,
        track: Arc<T>,
        markers: Arc<M>,
        seeds: SeedSelection,
        config: &BuildConfig,
    ) -> Self {
        let mut known = BTreeMap::new();
        let mut report = DiscoveryReport::default();
        for def in seeds.tool_nodes.iter().cloned() {
            merge_definition(&mut known, def, &mut report);
        }
        Self {
            region,
            track,
            markers,
            anchor_radius: config.anchor_radius,
            seed_radius: config.seed_radius,
            seeds,
            phase: LocalPhase::Collecting,
            cursor: MarkerCursor::new(),
            known,
            visited: FxHashSet::default(),
            queue: VecDeque::new(),
            pending: VecDeque::new(),
            retained: Vec::new(),
            report,
            no_anchor: false,
        }
    }

    /// Track cells reached so far.
    pub fn visited_rails(&self) -> usize {
        self.visited.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len() + self.pending.len()
    }

    pub fn nodes_found(&self) -> usize {
        match self.phase {
            LocalPhase::Filtering | LocalPhase::Done => self.retained.len(),
            _ => self.known.len(),
        }
    }

    /// The retained nodes, or the no-start-anchor outcome.
    /// Meaningful once [`is_done`](IncrementalSession::is_done).
    pub fn finish(self) -> DiscoveryOutcome {
        if self.no_anchor {
            DiscoveryOutcome::NoStartAnchor { report: self.report }
        } else {
            DiscoveryOutcome::Nodes { nodes: self.retained, report: self.report }
        }
    }

    /// Resolve seed cells by priority: tool cells, nearest marker, requester.
    fn resolve_seeds(&self) -> Option<(Vec<CellPos>, SeedOrigin)> {
        let tool: Vec<CellPos> = self
            .seeds
            .tool_cells
            .iter()
            .copied()
            .filter(|&c| self.track.is_track(c))
            .collect();
        if !tool.is_empty() {
            return Some((tool, SeedOrigin::Tool));
        }

        let requester = self.seeds.requester?;
        let max_d2 = (self.seed_radius as i64) * (self.seed_radius as i64);
        let nearest_marker = self
            .known
            .values()
            .map(|d| (d.pos.distance_sq(requester), d))
            .filter(|(d2, _)| *d2 <= max_d2)
            .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
        if let Some((_, marker)) = nearest_marker {
            let cells = self.track.find_nearest_track_cells(marker.pos, self.seed_radius);
            if !cells.is_empty() {
                return Some((cells, SeedOrigin::NearestMarker(marker.id.clone())));
            }
        }

        let cells = self.track.find_nearest_track_cells(requester, self.seed_radius);
        (!cells.is_empty()).then_some((cells, SeedOrigin::Requester))
    }
}

impl<T: TrackCells, M: MarkerSource> IncrementalSession for LocalTrace<T, M> {
    fn is_done(&self) -> bool {
        self.phase == LocalPhase::Done
    }

    fn step(&mut self, budget: StepBudget) -> usize {
        let mut used = 0;
        while budget.allows(used) && !self.is_done() {
            used += 1;
            match self.phase {
                LocalPhase::Collecting => {
                    match self.cursor.next(self.markers.as_ref(), &self.region) {
                        Some(def) => merge_definition(&mut self.known, def, &mut self.report),
                        None => self.phase = LocalPhase::Seeding,
                    }
                }
                LocalPhase::Seeding => match self.resolve_seeds() {
                    Some((cells, origin)) => {
                        for cell in cells {
                            if self.visited.insert(cell) {
                                self.queue.push_back(cell);
                            }
                        }
                        self.report.seed_origin = Some(origin);
                        self.phase = LocalPhase::Tracing;
                    }
                    None => {
                        self.no_anchor = true;
                        self.phase = LocalPhase::Done;
                    }
                },
                LocalPhase::Tracing => match self.queue.pop_front() {
                    Some(cell) => {
                        for n in self.track.neighbors(cell) {
                            if self.visited.insert(n) {
                                self.queue.push_back(n);
                            }
                        }
                    }
                    None => {
                        self.pending = std::mem::take(&mut self.known).into_values().collect();
                        self.phase = LocalPhase::Filtering;
                    }
                },
                LocalPhase::Filtering => match self.pending.pop_front() {
                    Some(def) => {
                        let anchors: Vec<CellPos> = self
                            .track
                            .find_nearest_track_cells(def.pos, self.anchor_radius)
                            .into_iter()
                            .filter(|c| self.visited.contains(c))
                            .collect();
                        if anchors.is_empty() {
                            self.report.disconnected += 1;
                        } else {
                            self.retained.push(AnchoredNode { node: def.to_node(), anchors });
                        }
                    }
                    None => self.phase = LocalPhase::Done,
                },
                LocalPhase::Done => {}
            }
        }
        used
    }
}

// ── DiscoverySession ──────────────────────────────────────────────────────────

/// Either discovery mode behind one stepping interface.
pub enum DiscoverySession<T, M> {
    Full(FullScan<T, M>),
    Local(LocalTrace<T, M>),
}

impl<T: TrackCells, M: MarkerSource> DiscoverySession<T, M> {
    pub fn visited_rails(&self) -> usize {
        match self {
            DiscoverySession::Full(_) => 0,
            DiscoverySession::Local(s) => s.visited_rails(),
        }
    }

    pub fn queue_len(&self) -> usize {
        match self {
            DiscoverySession::Full(s) => s.queue_len(),
            DiscoverySession::Local(s) => s.queue_len(),
        }
    }

    pub fn nodes_found(&self) -> usize {
        match self {
            DiscoverySession::Full(s) => s.nodes_found(),
            DiscoverySession::Local(s) => s.nodes_found(),
        }
    }

    pub fn finish(self) -> DiscoveryOutcome {
        match self {
            DiscoverySession::Full(s) => s.finish(),
            DiscoverySession::Local(s) => s.finish(),
        }
    }
}

impl<T: TrackCells, M: MarkerSource> IncrementalSession for DiscoverySession<T, M> {
    fn is_done(&self) -> bool {
        match self {
            DiscoverySession::Full(s) => s.is_done(),
            DiscoverySession::Local(s) => s.is_done(),
        }
    }

    fn step(&mut self, budget: StepBudget) -> usize {
        match self {
            DiscoverySession::Full(s) => s.step(budget),
            DiscoverySession::Local(s) => s.step(budget),
        }
    }
}

/// `true` for nodes whose anchors mark an explicit branch point.
pub(crate) fn is_switcher(node: &AnchoredNode) -> bool {
    node.node.node_type == NodeType::Switcher
}
