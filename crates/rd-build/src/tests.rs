//! Unit tests for rd-build.

use std::sync::Arc;

use rd_core::{BuildConfig, CellPos, NodeId, RegionId, StepBudget};
use rd_graph::{NodeType, TrackGrid};

use crate::{
    BuildError, BuildObserver, BuildOutput, BuildPhase, BuildRegistry, DiscoveryMode,
    GraphBuildJob, MarkerTable, NodeDefinition,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn p(x: i32, z: i32) -> CellPos {
    CellPos::new(x, 64, z)
}

/// Marker one level above the track cell at `(x, z)`.
fn marker(id: &str, node_type: NodeType, x: i32, z: i32) -> NodeDefinition {
    NodeDefinition::new(id, node_type, CellPos::new(x, 65, z))
}

fn region() -> RegionId {
    RegionId::new("main")
}

fn table(defs: Vec<NodeDefinition>) -> MarkerTable {
    let mut t = MarkerTable::new();
    t.extend(region(), defs);
    t
}

/// Straight line of 43 cells from x=0 to x=42, plus a separate 11-cell line
/// at z=100 that nothing connects to.
fn line_with_island() -> TrackGrid {
    let mut g = TrackGrid::new();
    g.add_line(p(0, 0), p(42, 0));
    g.add_line(p(0, 100), p(10, 100));
    g
}

/// T layout: main line x=0..=20 at z=0, branch from (10, 0) to (10, 10).
fn tee() -> TrackGrid {
    let mut g = TrackGrid::new();
    g.add_line(p(0, 0), p(20, 0));
    g.add_line(p(10, 1), p(10, 10));
    g
}

#[derive(Default)]
struct Recorder {
    phases:   Vec<BuildPhase>,
    outputs:  Vec<BuildOutput>,
    failures: Vec<BuildError>,
}

impl BuildObserver for Recorder {
    fn on_phase(&mut self, _region: &RegionId, phase: BuildPhase) {
        self.phases.push(phase);
    }

    fn on_success(&mut self, output: BuildOutput) {
        self.outputs.push(output);
    }

    fn on_failure(&mut self, _region: &RegionId, error: BuildError) {
        self.failures.push(error);
    }
}

fn start(
    registry: &BuildRegistry,
    track: TrackGrid,
    markers: MarkerTable,
    mode: DiscoveryMode,
) -> GraphBuildJob<TrackGrid, MarkerTable> {
    GraphBuildJob::start(
        registry,
        region(),
        Arc::new(track),
        Arc::new(markers),
        mode,
        &BuildConfig::default(),
    )
    .unwrap()
}

fn run_to_end(job: &mut GraphBuildJob<TrackGrid, MarkerTable>, rec: &mut Recorder) {
    for _ in 0..100_000 {
        if job.is_done() {
            return;
        }
        job.step(StepBudget::units(32), rec);
    }
    panic!("job did not finish");
}

fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

// ── Marker loader ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::{Cursor, Write};

    use super::*;
    use crate::{load_markers_csv, load_markers_reader};

    const CSV: &str = "\
region,id,type,x,y,z,destination,operator,name,platform
main,central,Station,120,64,-30,,RLX,Central,1
main,j-north,switcher,80,64,-30,north,,,
other,wp-7,waypoint,200,66,-30,,,,
";

    #[test]
    fn parses_rows_per_region() {
        let t = load_markers_reader(Cursor::new(CSV)).unwrap();
        assert_eq!(t.region_count(), 2);
        assert_eq!(t.len(), 3);

        let main = t.markers(&region());
        assert_eq!(main[0].id, id("central"));
        assert_eq!(main[0].node_type, NodeType::Station);
        let meta = main[0].meta.as_ref().unwrap();
        assert_eq!(meta.operator.as_deref(), Some("RLX"));
        assert_eq!(meta.platform, Some(1));
        assert!(main[0].destination.is_none());

        assert_eq!(main[1].destination.as_deref(), Some("north"));
        assert!(main[1].meta.is_none());
    }

    #[test]
    fn unknown_type_is_parse_error() {
        let bad = "region,id,type,x,y,z,destination,operator,name,platform\nmain,a,tunnel,0,0,0,,,,\n";
        let err = load_markers_reader(Cursor::new(bad)).unwrap_err();
        assert!(matches!(err, BuildError::Parse(msg) if msg.contains("row 1")));
    }

    #[test]
    fn reads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(CSV.as_bytes()).unwrap();
        let t = load_markers_csv(f.path()).unwrap();
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_markers_csv(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, BuildError::Io(_)));
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod discovery {
    use super::*;
    use crate::{
        DiscoveryOutcome, FullScan, IncrementalSession, LocalTrace, SeedOrigin, SeedSelection,
    };

    fn full(track: TrackGrid, markers: MarkerTable) -> DiscoveryOutcome {
        let mut s = FullScan::new(region(), Arc::new(track), Arc::new(markers), &BuildConfig::default());
        while !s.is_done() {
            s.step(StepBudget::units(7));
        }
        s.finish()
    }

    fn local(track: TrackGrid, markers: MarkerTable, seeds: SeedSelection) -> DiscoveryOutcome {
        let mut s = LocalTrace::new(
            region(),
            Arc::new(track),
            Arc::new(markers),
            seeds,
            &BuildConfig::default(),
        );
        while !s.is_done() {
            s.step(StepBudget::units(7));
        }
        s.finish()
    }

    fn ids(outcome: &DiscoveryOutcome) -> Vec<String> {
        match outcome {
            DiscoveryOutcome::Nodes { nodes, .. } => {
                nodes.iter().map(|n| n.node.id().to_string()).collect()
            }
            DiscoveryOutcome::NoStartAnchor { .. } => panic!("expected nodes"),
        }
    }

    #[test]
    fn full_scan_anchors_every_marker() {
        let out = full(
            line_with_island(),
            table(vec![
                marker("depot", NodeType::Depot, 0, 0),
                marker("isle", NodeType::Station, 5, 100),
            ]),
        );
        let DiscoveryOutcome::Nodes { nodes, report } = out else { panic!() };
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].anchors, vec![p(0, 0)]);
        assert_eq!(report.markers_scanned, 2);
        assert_eq!(report.unanchored, 0);
    }

    #[test]
    fn tagged_definition_replaces_provisional_switcher() {
        let out = full(
            tee(),
            table(vec![
                marker("sw", NodeType::Switcher, 10, 0),
                marker("sw", NodeType::Switcher, 10, 0).with_destination("north"),
            ]),
        );
        let DiscoveryOutcome::Nodes { nodes, report } = out else { panic!() };
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node.destination.as_deref(), Some("north"));
        assert_eq!(report.conflicts.len(), 1);
        assert!(report.conflicts[0].dropped.destination.is_none());
    }

    #[test]
    fn first_definition_wins_without_tag_precedence() {
        let out = full(
            tee(),
            table(vec![
                marker("x", NodeType::Station, 0, 0),
                marker("x", NodeType::Depot, 20, 0),
            ]),
        );
        let DiscoveryOutcome::Nodes { nodes, report } = out else { panic!() };
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].node.node_type, NodeType::Station);
        assert_eq!(report.conflicts[0].kept.node_type, NodeType::Station);
        assert_eq!(report.conflicts[0].dropped.node_type, NodeType::Depot);
    }

    #[test]
    fn identical_duplicates_and_empty_ids() {
        let out = full(
            tee(),
            table(vec![
                marker("a", NodeType::Waypoint, 0, 0),
                marker("a", NodeType::Waypoint, 0, 0),
                marker("", NodeType::Waypoint, 20, 0),
            ]),
        );
        let DiscoveryOutcome::Nodes { nodes, report } = out else { panic!() };
        assert_eq!(nodes.len(), 1);
        assert!(report.conflicts.is_empty());
        assert_eq!(report.invalid, 1);
        assert_eq!(report.markers_scanned, 3);
    }

    #[test]
    fn full_scan_keeps_unanchored_nodes() {
        let out = full(tee(), table(vec![marker("far", NodeType::Station, 500, 500)]));
        let DiscoveryOutcome::Nodes { nodes, report } = out else { panic!() };
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].anchors.is_empty());
        assert_eq!(report.unanchored, 1);
    }

    #[test]
    fn full_scan_pages_through_large_regions() {
        let mut g = TrackGrid::new();
        g.add_line(p(0, 0), p(700, 0));
        let defs = (0..300).map(|i| marker(&format!("n{i:03}"), NodeType::Waypoint, i * 2, 0)).collect();
        let out = full(g, table(defs));
        assert_eq!(ids(&out).len(), 300);
    }

    #[test]
    fn local_trace_excludes_disconnected_nodes() {
        let out = local(
            line_with_island(),
            table(vec![
                marker("depot", NodeType::Depot, 0, 0),
                marker("wp", NodeType::Waypoint, 42, 0),
                marker("isle", NodeType::Station, 5, 100),
            ]),
            SeedSelection::from_requester(CellPos::new(0, 65, 2)),
        );
        assert_eq!(ids(&out), vec!["depot", "wp"]);
        let DiscoveryOutcome::Nodes { report, .. } = out else { panic!() };
        assert_eq!(report.disconnected, 1);
        assert_eq!(report.seed_origin, Some(SeedOrigin::NearestMarker(id("depot"))));
    }

    #[test]
    fn tool_cells_take_priority() {
        let out = local(
            line_with_island(),
            table(vec![
                marker("depot", NodeType::Depot, 0, 0),
                marker("isle", NodeType::Station, 5, 100),
            ]),
            SeedSelection {
                tool_cells: vec![p(3, 100), CellPos::new(999, 0, 999)],
                requester: Some(CellPos::new(0, 65, 2)),
                ..SeedSelection::default()
            },
        );
        assert_eq!(ids(&out), vec!["isle"]);
        let DiscoveryOutcome::Nodes { report, .. } = out else { panic!() };
        assert_eq!(report.seed_origin, Some(SeedOrigin::Tool));
    }

    #[test]
    fn requester_track_is_last_resort() {
        let out = local(
            line_with_island(),
            table(vec![marker("isle", NodeType::Station, 5, 100)]),
            SeedSelection::from_requester(CellPos::new(0, 65, 1)),
        );
        let DiscoveryOutcome::Nodes { report, nodes } = out else { panic!() };
        assert!(nodes.is_empty());
        assert_eq!(report.disconnected, 1);
        assert_eq!(report.seed_origin, Some(SeedOrigin::Requester));
    }

    #[test]
    fn tool_nodes_are_preseeded() {
        let out = local(
            line_with_island(),
            MarkerTable::new(),
            SeedSelection {
                tool_cells: vec![p(0, 0)],
                tool_nodes: vec![marker("preset", NodeType::Depot, 20, 0)],
                requester: None,
            },
        );
        assert_eq!(ids(&out), vec!["preset"]);
    }

    #[test]
    fn no_track_under_seed_is_reported() {
        let out = local(
            line_with_island(),
            MarkerTable::new(),
            SeedSelection::from_requester(CellPos::new(300, 64, 300)),
        );
        assert!(matches!(out, DiscoveryOutcome::NoStartAnchor { .. }));
    }

    #[test]
    fn step_respects_budget() {
        let mut s = LocalTrace::new(
            region(),
            Arc::new(line_with_island()),
            Arc::new(MarkerTable::new()),
            SeedSelection::from_cells([p(0, 0)]),
            &BuildConfig::default(),
        );
        let mut total = 0;
        while !s.is_done() {
            let used = s.step(StepBudget::units(5));
            assert!(used <= 5);
            total += used;
        }
        assert_eq!(s.visited_rails(), 43);
        assert!(total >= 43);
    }
}

// ── Explorer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod explorer {
    use rd_graph::RailNode;

    use super::*;
    use crate::{AnchoredNode, IncrementalSession, MultiSourceExplorer};

    fn anchored(id: &str, node_type: NodeType, anchors: Vec<CellPos>) -> AnchoredNode {
        let pos = anchors.first().copied().unwrap_or_default();
        AnchoredNode { node: RailNode::new(id, node_type, pos), anchors }
    }

    fn explore(track: TrackGrid, nodes: &[AnchoredNode]) -> crate::ExplorerOutcome {
        let mut e = MultiSourceExplorer::new(Arc::new(track), nodes, 2, 32);
        while !e.is_done() {
            e.step(StepBudget::units(3));
        }
        e.finish()
    }

    #[test]
    fn line_distance_is_cell_steps() {
        let out = explore(
            line_with_island(),
            &[
                anchored("a", NodeType::Depot, vec![p(0, 0)]),
                anchored("b", NodeType::Waypoint, vec![p(42, 0)]),
            ],
        );
        assert_eq!(out.edges.len(), 1);
        assert_eq!(out.edges[0].a, id("a"));
        assert_eq!(out.edges[0].length, 42);
        assert_eq!(out.visited, 43);
    }

    #[test]
    fn only_direct_edges_are_found() {
        let out = explore(
            line_with_island(),
            &[
                anchored("a", NodeType::Waypoint, vec![p(0, 0)]),
                anchored("b", NodeType::Waypoint, vec![p(20, 0)]),
                anchored("c", NodeType::Waypoint, vec![p(42, 0)]),
            ],
        );
        let pairs: Vec<(String, String, u32)> = out
            .edges
            .iter()
            .map(|e| (e.a.to_string(), e.b.to_string(), e.length))
            .collect();
        assert_eq!(pairs, vec![("a".into(), "b".into(), 20), ("b".into(), "c".into(), 22)]);
    }

    #[test]
    fn shared_anchor_gives_zero_length() {
        let out = explore(
            tee(),
            &[
                anchored("a", NodeType::Station, vec![p(5, 0)]),
                anchored("b", NodeType::Station, vec![p(5, 0), p(6, 0)]),
            ],
        );
        assert_eq!(out.edges[0].length, 0);
    }

    #[test]
    fn unanchored_nodes_are_ignored() {
        let out = explore(tee(), &[anchored("a", NodeType::Station, vec![])]);
        assert!(out.edges.is_empty());
        assert_eq!(out.visited, 0);
    }

    #[test]
    fn junction_without_switcher_is_flagged() {
        let out = explore(
            tee(),
            &[
                anchored("w1", NodeType::Waypoint, vec![p(0, 0)]),
                anchored("w2", NodeType::Waypoint, vec![p(20, 0)]),
                anchored("w3", NodeType::Waypoint, vec![p(10, 10)]),
            ],
        );
        assert_eq!(out.missing_switchers, vec![p(10, 0)]);
    }

    #[test]
    fn junction_owned_by_nearer_node_is_flagged() {
        // w1 sits two cells from the junction and owns it along with both
        // arms, so w2 and w3 never touch it directly.
        let out = explore(
            tee(),
            &[
                anchored("w1", NodeType::Waypoint, vec![p(8, 0)]),
                anchored("w2", NodeType::Waypoint, vec![p(20, 0)]),
                anchored("w3", NodeType::Waypoint, vec![p(10, 10)]),
            ],
        );
        let pairs: Vec<(String, String, u32)> = out
            .edges
            .iter()
            .map(|e| (e.a.to_string(), e.b.to_string(), e.length))
            .collect();
        assert_eq!(pairs, vec![("w1".into(), "w2".into(), 12), ("w1".into(), "w3".into(), 12)]);
        assert_eq!(out.missing_switchers, vec![p(10, 0)]);
    }

    #[test]
    fn dead_end_spur_is_not_flagged() {
        // Only one arm beyond the junction leads to another node.
        let out = explore(
            tee(),
            &[
                anchored("w1", NodeType::Waypoint, vec![p(8, 0)]),
                anchored("w2", NodeType::Waypoint, vec![p(20, 0)]),
            ],
        );
        assert_eq!(out.edges.len(), 1);
        assert!(out.missing_switchers.is_empty());
    }

    #[test]
    fn node_on_the_junction_is_not_flagged() {
        let out = explore(
            tee(),
            &[
                anchored("hub", NodeType::Station, vec![p(10, 0)]),
                anchored("w2", NodeType::Waypoint, vec![p(20, 0)]),
                anchored("w3", NodeType::Waypoint, vec![p(10, 10)]),
            ],
        );
        assert_eq!(out.edges.len(), 2);
        assert!(out.missing_switchers.is_empty());
    }

    #[test]
    fn switcher_covers_its_junction() {
        let out = explore(
            tee(),
            &[
                anchored("sw", NodeType::Switcher, vec![p(10, 0)]),
                anchored("w1", NodeType::Waypoint, vec![p(0, 0)]),
                anchored("w2", NodeType::Waypoint, vec![p(20, 0)]),
                anchored("w3", NodeType::Waypoint, vec![p(10, 10)]),
            ],
        );
        assert!(out.missing_switchers.is_empty());
        assert_eq!(out.edges.len(), 3);
        assert!(out.edges.iter().all(|e| e.a == id("sw") && e.length == 10));
    }

    #[test]
    fn missing_switchers_are_capped() {
        let mut e = MultiSourceExplorer::new(
            Arc::new(tee()),
            &[
                anchored("w1", NodeType::Waypoint, vec![p(0, 0)]),
                anchored("w2", NodeType::Waypoint, vec![p(20, 0)]),
                anchored("w3", NodeType::Waypoint, vec![p(10, 10)]),
            ],
            2,
            0,
        );
        e.step(StepBudget::unbounded());
        assert!(e.is_done());
        assert!(e.finish().missing_switchers.is_empty());
    }
}

// ── Build job ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod job {
    use super::*;
    use crate::{build_blocking, DiscoveryReport, SeedSelection};

    #[test]
    fn local_build_from_depot() {
        let registry = BuildRegistry::new();
        let mut job = start(
            &registry,
            line_with_island(),
            table(vec![
                marker("depot", NodeType::Depot, 0, 0),
                marker("wp", NodeType::Waypoint, 42, 0),
                marker("isle", NodeType::Station, 5, 100),
            ]),
            DiscoveryMode::Local(SeedSelection::from_requester(CellPos::new(0, 65, 2))),
        );
        let mut rec = Recorder::default();
        run_to_end(&mut job, &mut rec);

        assert_eq!(rec.outputs.len(), 1);
        let graph = &rec.outputs[0].graph;
        assert_eq!(graph.node_count(), 2);
        assert!(!graph.contains(&id("isle")));
        let e = graph.edge(&id("depot"), &id("wp")).unwrap();
        assert_eq!(e.length, 42);
        assert_eq!(rec.phases, vec![BuildPhase::Exploring, BuildPhase::Finished]);
        assert_eq!(job.phase(), BuildPhase::Finished);
        assert!(!registry.is_active(&region()));
    }

    #[test]
    fn tee_without_switcher_still_builds() {
        let registry = BuildRegistry::new();
        let mut job = start(
            &registry,
            tee(),
            table(vec![
                marker("w1", NodeType::Waypoint, 0, 0),
                marker("w2", NodeType::Waypoint, 20, 0),
                marker("w3", NodeType::Waypoint, 10, 10),
            ]),
            DiscoveryMode::Full,
        );
        let mut rec = Recorder::default();
        run_to_end(&mut job, &mut rec);

        let out = &rec.outputs[0];
        assert_eq!(out.missing_switchers, vec![p(10, 0)]);
        assert_eq!(out.graph.node_count(), 3);
        assert!(out.graph.edge_count() >= 2);
        assert!(rec.failures.is_empty());
    }

    #[test]
    fn edges_carry_endpoint_meta_and_speed() {
        let meta = rd_graph::NodeMeta { name: Some("Central".into()), ..Default::default() };
        let mut markers = table(vec![marker("a", NodeType::Station, 0, 0).with_meta(meta.clone())]);
        markers.insert(region(), marker("b", NodeType::Waypoint, 10, 0));
        let out = build_blocking(
            region(),
            Arc::new(tee()),
            Arc::new(markers),
            DiscoveryMode::Full,
            &BuildConfig::default(),
        )
        .unwrap();
        let e = out.graph.edge(&id("a"), &id("b")).unwrap();
        assert_eq!(e.speed_limit, BuildConfig::default().default_speed_limit);
        assert_eq!(e.meta.as_ref().unwrap().from, Some(meta));
        assert!(e.bidirectional);
    }

    #[test]
    fn second_start_for_region_fails() {
        let registry = BuildRegistry::new();
        let mut first = start(&registry, tee(), MarkerTable::new(), DiscoveryMode::Full);
        let second = GraphBuildJob::start(
            &registry,
            region(),
            Arc::new(tee()),
            Arc::new(MarkerTable::new()),
            DiscoveryMode::Full,
            &BuildConfig::default(),
        );
        assert!(matches!(second, Err(BuildError::AlreadyRunning(_))));

        run_to_end(&mut first, &mut Recorder::default());
        let again = start(&registry, tee(), MarkerTable::new(), DiscoveryMode::Full);
        assert_eq!(again.phase(), BuildPhase::Discovering);
    }

    #[test]
    fn invalid_config_is_rejected_before_claiming() {
        let registry = BuildRegistry::new();
        let config = BuildConfig { step_budget_cells: 0, ..BuildConfig::default() };
        let job = GraphBuildJob::start(
            &registry,
            region(),
            Arc::new(tee()),
            Arc::new(MarkerTable::new()),
            DiscoveryMode::Full,
            &config,
        );
        assert!(matches!(job, Err(BuildError::Config(_))));
        assert!(!registry.is_active(&region()));

        let config = BuildConfig { default_speed_limit: f32::NAN, ..BuildConfig::default() };
        let out = build_blocking(
            region(),
            Arc::new(tee()),
            Arc::new(MarkerTable::new()),
            DiscoveryMode::Full,
            &config,
        );
        assert!(matches!(out, Err(BuildError::Config(_))));
    }

    #[test]
    fn independent_registries_do_not_interfere() {
        let a = BuildRegistry::new();
        let b = BuildRegistry::new();
        let _slot = a.try_claim(&region()).unwrap();
        assert!(b.try_claim(&region()).is_ok());
    }

    #[test]
    fn cancel_stops_progress_and_callbacks() {
        let registry = BuildRegistry::new();
        let mut job = start(
            &registry,
            line_with_island(),
            table(vec![
                marker("a", NodeType::Depot, 0, 0),
                marker("b", NodeType::Waypoint, 42, 0),
            ]),
            DiscoveryMode::Full,
        );
        let mut rec = Recorder::default();
        job.step(StepBudget::units(3), &mut rec);
        let before = job.status().processed;

        job.cancel();
        assert!(job.is_done());
        assert!(!registry.is_active(&region()));
        assert_eq!(job.step(StepBudget::unbounded(), &mut rec), 0);
        assert_eq!(job.status().processed, before);
        assert_eq!(job.phase(), BuildPhase::Cancelled);
        assert!(rec.outputs.is_empty());
        assert!(rec.failures.is_empty());
    }

    #[test]
    fn status_reports_progress() {
        let registry = BuildRegistry::new();
        let mut job = start(
            &registry,
            line_with_island(),
            MarkerTable::new(),
            DiscoveryMode::Local(SeedSelection::from_cells([p(0, 0)])),
        );
        let mut rec = Recorder::default();
        let used = job.step(StepBudget::units(10), &mut rec);
        assert!(used <= 10);
        let st = job.status();
        assert_eq!(st.phase, BuildPhase::Discovering);
        assert_eq!(st.processed, used);
        assert!(st.visited > 0);
        assert!(st.queue > 0);
    }

    #[test]
    fn empty_region_succeeds_when_stepped() {
        let registry = BuildRegistry::new();
        let mut job = start(&registry, tee(), MarkerTable::new(), DiscoveryMode::Full);
        let mut rec = Recorder::default();
        run_to_end(&mut job, &mut rec);
        assert_eq!(rec.outputs.len(), 1);
        assert!(rec.outputs[0].graph.is_empty());
        assert_eq!(rec.outputs[0].discovery, DiscoveryReport::default());
    }

    #[test]
    fn empty_region_is_terminal_when_blocking() {
        let err = build_blocking(
            region(),
            Arc::new(tee()),
            Arc::new(MarkerTable::new()),
            DiscoveryMode::Full,
            &BuildConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::NoNodes(_)));
    }

    #[test]
    fn missing_start_anchor_fails_the_job() {
        let registry = BuildRegistry::new();
        let mut job = start(
            &registry,
            tee(),
            MarkerTable::new(),
            DiscoveryMode::Local(SeedSelection::from_requester(CellPos::new(400, 64, 400))),
        );
        let mut rec = Recorder::default();
        run_to_end(&mut job, &mut rec);
        assert!(matches!(rec.failures.as_slice(), [BuildError::NoStartAnchor(_)]));
        assert!(rec.outputs.is_empty());
        assert_eq!(job.phase(), BuildPhase::Failed);
        assert!(!registry.is_active(&region()));
    }
}

// ── Properties ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;
    use crate::build_blocking;

    fn build_line(defs: Vec<NodeDefinition>) -> BuildOutput {
        let mut g = TrackGrid::new();
        g.add_line(p(0, 0), p(80, 0));
        build_blocking(
            region(),
            Arc::new(g),
            Arc::new(table(defs)),
            DiscoveryMode::Full,
            &BuildConfig::default(),
        )
        .unwrap()
    }

    proptest! {
        #[test]
        fn edge_length_is_symmetric(a in 0i32..40, gap in 1i32..40) {
            let b = a + gap;
            let forward = build_line(vec![
                marker("k", NodeType::Waypoint, a, 0),
                marker("m", NodeType::Waypoint, b, 0),
            ]);
            let mirrored = build_line(vec![
                marker("m", NodeType::Waypoint, a, 0),
                marker("k", NodeType::Waypoint, b, 0),
            ]);
            let reordered = build_line(vec![
                marker("m", NodeType::Waypoint, b, 0),
                marker("k", NodeType::Waypoint, a, 0),
            ]);

            let km = forward.graph.edge(&id("k"), &id("m")).unwrap();
            let mk = mirrored.graph.edge(&id("m"), &id("k")).unwrap();
            prop_assert_eq!(km.length, gap as u32);
            prop_assert_eq!(mk.length, km.length);
            prop_assert!(km.bidirectional && mk.bidirectional);
            prop_assert_eq!(forward.graph.signature(), reordered.graph.signature());
        }
    }
}
