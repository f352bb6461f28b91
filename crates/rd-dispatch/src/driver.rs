//! `BuildDriver` — owns in-flight build jobs and steps them from the host's
//! periodic tick.
//!
//! # Tick loop
//!
//! ```text
//! for each active job (region order):
//!   1. job.step(budget)
//!   2. on success → publish to GraphCatalog → SnapshotSink::save
//!      on failure → record BuildEvent::Failed
//! drop every job that is done
//! ```
//!
//! Each job gets the full `budget` per tick.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use rd_build::{
    BuildError, BuildObserver, BuildOutput, BuildRegistry, BuildStatus, DiscoveryMode,
    GraphBuildJob, MarkerSource, SeedSelection,
};
use rd_core::{BuildConfig, RegionId, StepBudget, Timestamp};
use rd_graph::TrackCells;

use crate::catalog::{BuildReport, GraphCatalog};
use crate::sink::SnapshotSink;
use crate::{DispatchError, DispatchResult};

/// Something that happened to a build during a [`BuildDriver::tick`].
#[derive(Debug)]
pub enum BuildEvent {
    /// A build finished and its graph is now in the catalog.
    Published(BuildReport),
    /// A build aborted; the catalog still holds the previous snapshot.
    Failed { region: RegionId, error: BuildError },
    /// The graph was published but the snapshot sink could not save it.
    SaveFailed { region: RegionId, error: DispatchError },
}

/// Collects the outcome of one job's step.
#[derive(Default)]
struct Outcome {
    success: Option<BuildOutput>,
    failure: Option<BuildError>,
}

impl BuildObserver for Outcome {
    fn on_success(&mut self, output: BuildOutput) {
        self.success = Some(output);
    }

    fn on_failure(&mut self, _region: &RegionId, error: BuildError) {
        self.failure = Some(error);
    }
}

/// Starts, steps, and cancels graph builds for any number of regions.
pub struct BuildDriver<T, M> {
    registry: BuildRegistry,
    track:    Arc<T>,
    markers:  Arc<M>,
    config:   BuildConfig,
    catalog:  Arc<GraphCatalog>,
    sink:     Option<Box<dyn SnapshotSink>>,
    jobs:     BTreeMap<RegionId, GraphBuildJob<T, M>>,
}

impl<T: TrackCells, M: MarkerSource> BuildDriver<T, M> {
    pub fn new(
        track: Arc<T>,
        markers: Arc<M>,
        catalog: Arc<GraphCatalog>,
        config: BuildConfig,
    ) -> Self {
        Self {
            registry: BuildRegistry::new(),
            track,
            markers,
            config,
            catalog,
            sink: None,
            jobs: BTreeMap::new(),
        }
    }

    /// Share `registry` with other drivers or tools instead of a private one.
    pub fn with_registry(mut self, registry: BuildRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn SnapshotSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn catalog(&self) -> &Arc<GraphCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Start a full-scan build of `region`.
    pub fn start_full(&mut self, region: RegionId) -> DispatchResult<()> {
        self.start(region, DiscoveryMode::Full)
    }

    /// Start a local build of `region` around `seeds`.
    pub fn start_local(&mut self, region: RegionId, seeds: SeedSelection) -> DispatchResult<()> {
        self.start(region, DiscoveryMode::Local(seeds))
    }

    fn start(&mut self, region: RegionId, mode: DiscoveryMode) -> DispatchResult<()> {
        let job = GraphBuildJob::start(
            &self.registry,
            region.clone(),
            Arc::clone(&self.track),
            Arc::clone(&self.markers),
            mode,
            &self.config,
        )?;
        self.jobs.insert(region, job);
        Ok(())
    }

    pub fn status(&self, region: &RegionId) -> Option<BuildStatus> {
        self.jobs.get(region).map(GraphBuildJob::status)
    }

    /// Cancel `region`'s build.  Returns `false` if none was running.
    pub fn cancel(&mut self, region: &RegionId) -> bool {
        match self.jobs.remove(region) {
            Some(mut job) => {
                job.cancel();
                true
            }
            None => false,
        }
    }

    /// Regions with a build in flight, sorted.
    pub fn active_regions(&self) -> Vec<RegionId> {
        self.jobs.keys().cloned().collect()
    }

    pub fn is_idle(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Step every active job once with `budget`; `now` stamps published builds.
    pub fn tick(&mut self, budget: StepBudget, now: Timestamp) -> Vec<BuildEvent> {
        let mut events = Vec::new();
        for (region, job) in self.jobs.iter_mut() {
            let mut outcome = Outcome::default();
            job.step(budget, &mut outcome);

            if let Some(error) = outcome.failure {
                events.push(BuildEvent::Failed { region: region.clone(), error });
            }
            if let Some(output) = outcome.success {
                let report = self.catalog.publish(output, now);
                info!(
                    region = %region,
                    changed = report.changed,
                    missing_switchers = report.missing_switchers.len(),
                    "snapshot published"
                );
                if let Some(sink) = self.sink.as_mut() {
                    if let Some(graph) = self.catalog.graph(region) {
                        if let Err(error) = sink.save(&graph, &report) {
                            warn!(region = %region, error = %error, "snapshot save failed");
                            events.push(BuildEvent::SaveFailed { region: region.clone(), error });
                        }
                    }
                }
                events.push(BuildEvent::Published(report));
            }
        }
        self.jobs.retain(|_, job| !job.is_done());
        events
    }

    /// Tick until every job is done.  For tools and tests.
    pub fn run_to_idle(&mut self, budget: StepBudget, now: Timestamp) -> Vec<BuildEvent> {
        let mut events = Vec::new();
        while !self.is_idle() {
            events.extend(self.tick(budget, now));
        }
        events
    }
}
