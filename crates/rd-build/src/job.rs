//! Graph build job: discovery, then exploration, then atomic assembly.
//!
//! A [`GraphBuildJob`] is driven from outside by repeated calls to
//! [`step`](GraphBuildJob::step), each bounded by a [`StepBudget`].  When the
//! explorer finishes, the job assembles a [`RailGraph`] in one go and hands a
//! [`BuildOutput`] to the observer; a failed job hands over its
//! [`BuildError`] instead.  Either way the region's registry slot is freed
//! and the job reports [`is_done`](GraphBuildJob::is_done).
//!
//! [`build_blocking`] runs the same two phases to completion without
//! yielding.  It can stall the caller on large regions and is meant for
//! offline tooling.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use rd_core::{BuildConfig, CellPos, NodeId, RegionId, StepBudget};
use rd_graph::{EdgeMeta, NodeMeta, RailEdge, RailGraph, RailGraphBuilder, TrackCells};

use crate::discovery::{
    AnchoredNode, DiscoveryOutcome, DiscoveryReport, DiscoverySession, FullScan, LocalTrace,
    SeedSelection,
};
use crate::error::{BuildError, BuildResult};
use crate::explorer::{ExplorerOutcome, MultiSourceExplorer};
use crate::marker::MarkerSource;
use crate::registry::{BuildRegistry, RegistrySlot};
use crate::session::IncrementalSession;

// ── Public types ──────────────────────────────────────────────────────────────

/// Which discovery mode a build runs.
#[derive(Clone, Debug, PartialEq)]
pub enum DiscoveryMode {
    Full,
    Local(SeedSelection),
}

/// Coarse progress of a build job.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BuildPhase {
    Discovering,
    Exploring,
    Finished,
    Failed,
    Cancelled,
}

impl BuildPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildPhase::Discovering => "discovering",
            BuildPhase::Exploring   => "exploring",
            BuildPhase::Finished    => "finished",
            BuildPhase::Failed      => "failed",
            BuildPhase::Cancelled   => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BuildPhase::Finished | BuildPhase::Failed | BuildPhase::Cancelled)
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time progress snapshot of a job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildStatus {
    pub region:      RegionId,
    pub phase:       BuildPhase,
    /// Track cells visited by the current phase.
    pub visited:     usize,
    /// Pending frontier or scan entries.
    pub queue:       usize,
    /// Work units spent so far across all steps.
    pub processed:   usize,
    pub nodes_found: usize,
}

/// Everything a successful build produces.
#[derive(Clone, Debug)]
pub struct BuildOutput {
    pub region:            RegionId,
    pub graph:             RailGraph,
    /// Junction cells reached by several origins with no switcher on them.
    pub missing_switchers: Vec<CellPos>,
    pub discovery:         DiscoveryReport,
    pub processed_steps:   usize,
}

/// Callbacks fired by [`GraphBuildJob::step`].
///
/// All methods have default no-op implementations.  After a job finishes,
/// fails or is cancelled, none of them fire again.
pub trait BuildObserver {
    /// The job moved to `phase`.
    fn on_phase(&mut self, _region: &RegionId, _phase: BuildPhase) {}

    /// The job assembled its graph.
    fn on_success(&mut self, _output: BuildOutput) {}

    /// The job aborted.  No graph was produced.
    fn on_failure(&mut self, _region: &RegionId, _error: BuildError) {}
}

/// A [`BuildObserver`] that ignores everything.
pub struct NoopBuildObserver;

impl BuildObserver for NoopBuildObserver {}

// ── GraphBuildJob ─────────────────────────────────────────────────────────────

enum JobState<T, M> {
    Discovering(DiscoverySession<T, M>),
    Exploring {
        nodes:    Vec<AnchoredNode>,
        report:   DiscoveryReport,
        explorer: MultiSourceExplorer<T>,
    },
    Done,
}

/// A cooperatively stepped graph build for one region.
pub struct GraphBuildJob<T, M> {
    region:    RegionId,
    config:    BuildConfig,
    track:     Arc<T>,
    state:     JobState<T, M>,
    phase:     BuildPhase,
    processed: usize,
    slot:      Option<RegistrySlot>,
}

impl<T: TrackCells, M: MarkerSource> GraphBuildJob<T, M> {
    /// Claim `region` in `registry` and prepare a job.
    ///
    /// Fails with [`BuildError::Config`] on an unusable `config` and with
    /// [`BuildError::AlreadyRunning`] if the region already has a build in
    /// flight.
    pub fn start(
        registry: &BuildRegistry,
        region: RegionId,
        track: Arc<T>,
        markers: Arc<M>,
        mode: DiscoveryMode,
        config: &BuildConfig,
    ) -> BuildResult<Self> {
        config.validate()?;
        let slot = registry.try_claim(&region)?;
        Ok(Self::with_slot(Some(slot), region, track, markers, mode, config))
    }

    fn with_slot(
        slot: Option<RegistrySlot>,
        region: RegionId,
        track: Arc<T>,
        markers: Arc<M>,
        mode: DiscoveryMode,
        config: &BuildConfig,
    ) -> Self {
        let local = matches!(mode, DiscoveryMode::Local(_));
        let session = match mode {
            DiscoveryMode::Full => DiscoverySession::Full(FullScan::new(
                region.clone(),
                Arc::clone(&track),
                markers,
                config,
            )),
            DiscoveryMode::Local(seeds) => DiscoverySession::Local(LocalTrace::new(
                region.clone(),
                Arc::clone(&track),
                markers,
                seeds,
                config,
            )),
        };
        info!(region = %region, local, "graph build started");
        Self {
            region,
            config: config.clone(),
            track,
            state: JobState::Discovering(session),
            phase: BuildPhase::Discovering,
            processed: 0,
            slot,
        }
    }

    pub fn region(&self) -> &RegionId {
        &self.region
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// `true` once the job finished, failed or was cancelled.
    pub fn is_done(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn status(&self) -> BuildStatus {
        let (visited, queue, nodes_found) = match &self.state {
            JobState::Discovering(s) => (s.visited_rails(), s.queue_len(), s.nodes_found()),
            JobState::Exploring { nodes, explorer, .. } => {
                (explorer.visited(), explorer.queue_len(), nodes.len())
            }
            JobState::Done => (0, 0, 0),
        };
        BuildStatus {
            region: self.region.clone(),
            phase: self.phase,
            visited,
            queue,
            processed: self.processed,
            nodes_found,
        }
    }

    /// Stop the job.  Takes effect immediately: no further progress is made
    /// and no observer callback fires for this job again.
    pub fn cancel(&mut self) {
        if self.is_done() {
            return;
        }
        self.state = JobState::Done;
        self.phase = BuildPhase::Cancelled;
        self.slot = None;
        info!(region = %self.region, processed = self.processed, "graph build cancelled");
    }

    /// Advance the job by at most `budget` work units.  Returns units spent.
    pub fn step(&mut self, budget: StepBudget, observer: &mut dyn BuildObserver) -> usize {
        let mut used = 0;
        while !self.is_done() && budget.allows(used) {
            let slice = budget.remaining(used);
            let spent = match &mut self.state {
                JobState::Discovering(session) => session.step(slice),
                JobState::Exploring { explorer, .. } => explorer.step(slice),
                JobState::Done => 0,
            };
            used += spent;
            self.processed += spent;
            let before = self.phase;
            self.advance(observer);
            if spent == 0 && self.phase == before {
                break;
            }
        }
        used
    }

    /// Move to the next phase if the current session is finished.
    fn advance(&mut self, observer: &mut dyn BuildObserver) {
        let finished = match &self.state {
            JobState::Discovering(s) => s.is_done(),
            JobState::Exploring { explorer, .. } => explorer.is_done(),
            JobState::Done => false,
        };
        if !finished {
            return;
        }

        match std::mem::replace(&mut self.state, JobState::Done) {
            JobState::Discovering(session) => match session.finish() {
                DiscoveryOutcome::NoStartAnchor { .. } => {
                    self.fail(observer, BuildError::NoStartAnchor(self.region.clone()));
                }
                DiscoveryOutcome::Nodes { nodes, report } => {
                    debug!(
                        region = %self.region,
                        nodes = nodes.len(),
                        conflicts = report.conflicts.len(),
                        "discovery finished"
                    );
                    let explorer = MultiSourceExplorer::new(
                        Arc::clone(&self.track),
                        &nodes,
                        self.config.anchor_radius,
                        self.config.missing_switcher_cap,
                    );
                    self.state = JobState::Exploring { nodes, report, explorer };
                    self.phase = BuildPhase::Exploring;
                    observer.on_phase(&self.region, BuildPhase::Exploring);
                }
            },
            JobState::Exploring { nodes, report, explorer } => {
                let explored = explorer.finish();
                match assemble(&nodes, &explored, self.config.default_speed_limit) {
                    Ok(graph) => self.succeed(observer, graph, explored, report),
                    Err(e) => self.fail(observer, e),
                }
            }
            JobState::Done => {}
        }
    }

    fn succeed(
        &mut self,
        observer: &mut dyn BuildObserver,
        graph: RailGraph,
        explored: ExplorerOutcome,
        discovery: DiscoveryReport,
    ) {
        self.phase = BuildPhase::Finished;
        self.slot = None;
        if !explored.missing_switchers.is_empty() {
            warn!(
                region = %self.region,
                count = explored.missing_switchers.len(),
                "junctions without a switcher marker"
            );
        }
        info!(
            region = %self.region,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            signature = %graph.signature(),
            processed = self.processed,
            "graph build finished"
        );
        observer.on_phase(&self.region, BuildPhase::Finished);
        observer.on_success(BuildOutput {
            region: self.region.clone(),
            graph,
            missing_switchers: explored.missing_switchers,
            discovery,
            processed_steps: self.processed,
        });
    }

    fn fail(&mut self, observer: &mut dyn BuildObserver, error: BuildError) {
        self.state = JobState::Done;
        self.phase = BuildPhase::Failed;
        self.slot = None;
        warn!(region = %self.region, error = %error, "graph build failed");
        observer.on_phase(&self.region, BuildPhase::Failed);
        observer.on_failure(&self.region, error);
    }
}

/// Turn discovered nodes and explored distances into a graph snapshot.
fn assemble(
    nodes: &[AnchoredNode],
    explored: &ExplorerOutcome,
    speed_limit: f32,
) -> BuildResult<RailGraph> {
    let mut builder = RailGraphBuilder::new();
    for anchored in nodes {
        builder.add_node(anchored.node.clone());
    }
    let metas: FxHashMap<&NodeId, &NodeMeta> = nodes
        .iter()
        .filter_map(|n| n.node.meta.as_ref().map(|m| (n.node.id(), m)))
        .collect();
    for found in &explored.edges {
        let mut edge = RailEdge::new(found.a.clone(), found.b.clone(), found.length, speed_limit);
        let meta = EdgeMeta {
            from: metas.get(&found.a).map(|m| (*m).clone()),
            to:   metas.get(&found.b).map(|m| (*m).clone()),
        };
        if meta.from.is_some() || meta.to.is_some() {
            edge.meta = Some(meta);
        }
        builder.add_edge(edge)?;
    }
    Ok(builder.build())
}

// ── Blocking build ────────────────────────────────────────────────────────────

#[derive(Default)]
struct Collect {
    result: Option<BuildResult<BuildOutput>>,
}

impl BuildObserver for Collect {
    fn on_success(&mut self, output: BuildOutput) {
        self.result = Some(Ok(output));
    }

    fn on_failure(&mut self, _region: &RegionId, error: BuildError) {
        self.result = Some(Err(error));
    }
}

/// Run a complete build without yielding.
///
/// Unlike the stepped job, an empty node set is a terminal
/// [`BuildError::NoNodes`].  No registry slot is taken.
pub fn build_blocking<T: TrackCells, M: MarkerSource>(
    region: RegionId,
    track: Arc<T>,
    markers: Arc<M>,
    mode: DiscoveryMode,
    config: &BuildConfig,
) -> BuildResult<BuildOutput> {
    config.validate()?;
    let mut job = GraphBuildJob::with_slot(None, region.clone(), track, markers, mode, config);
    let mut collect = Collect::default();
    while !job.is_done() {
        job.step(StepBudget::unbounded(), &mut collect);
    }
    let output = collect.result.unwrap_or(Err(BuildError::NoNodes(region)))?;
    if output.graph.is_empty() {
        return Err(BuildError::NoNodes(output.region));
    }
    Ok(output)
}
