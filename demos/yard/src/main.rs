//! yard — end-to-end walkthrough of the rail dispatch core.
//!
//! Builds the topology of a small synthetic yard in budgeted ticks, answers
//! a few path queries, then lets a handful of trains contend for track with
//! the occupancy ledger.
//!
//! Usage: `yard [config.json]`.  Set `RUST_LOG=debug` for build internals.

mod layout;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rd_core::{DispatchConfig, HolderId, NodeId, RegionId, StepBudget, Timestamp};
use rd_dispatch::{BuildDriver, BuildEvent, CsvSnapshotSink, Dispatcher, GraphCatalog};
use rd_graph::{Objective, PathOptions, RailPath};

use layout::{REGION, build_yard};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:         u64 = 7;
const TRAIN_COUNT:  usize = 4;
const ROUNDS:       u64 = 12;
const ROUND_MS:     u64 = 4_000;
const OUTPUT_DIR:   &str = "output/yard";
const STOPS:        [&str; 4] = ["depot", "central", "north-1", "spur-end"];

// ── Trains ────────────────────────────────────────────────────────────────────

struct Train {
    id:       HolderId,
    at:       NodeId,
    /// Reserved route and the time it clears the last edge.
    running:  Option<(RailPath, Timestamp)>,
}

fn load_config() -> Result<DispatchConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(DispatchConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config: DispatchConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    config.validate().with_context(|| format!("validating {path}"))?;
    Ok(config)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let region = RegionId::new(REGION);

    println!("=== yard — rail dispatch walkthrough ===");
    println!(
        "Trains: {TRAIN_COUNT}  |  Rounds: {ROUNDS}  |  Headway: {} ms  |  Seed: {SEED}",
        config.occupancy.headway_ms
    );
    println!();

    // 1. Track and markers.
    let (grid, markers) = build_yard()?;
    println!("Track: {} cells, {} markers", grid.len(), markers.len());

    // 2. Budgeted build, one tick at a time.
    let catalog = Arc::new(GraphCatalog::new());
    let mut driver = BuildDriver::new(
        Arc::new(grid),
        Arc::new(markers),
        Arc::clone(&catalog),
        config.build.clone(),
    )
    .with_sink(Box::new(CsvSnapshotSink::new(OUTPUT_DIR)));

    driver.start_full(region.clone())?;
    let budget = StepBudget::units(config.build.step_budget_cells);
    let t0 = Instant::now();
    let mut ticks = 0u64;
    while !driver.is_idle() {
        if let Some(st) = driver.status(&region) {
            println!(
                "  tick {ticks:>3}  {:<11} visited={:<5} queue={:<4} nodes={}",
                st.phase.as_str(),
                st.visited,
                st.queue,
                st.nodes_found
            );
        }
        for event in driver.tick(budget, Timestamp(ticks)) {
            match event {
                BuildEvent::Published(r) => println!(
                    "Published {}: {} nodes, {} edges, signature {}",
                    r.region, r.nodes, r.edges, r.signature
                ),
                BuildEvent::Failed { region, error } => println!("Build of {region} failed: {error}"),
                BuildEvent::SaveFailed { region, error } => {
                    eprintln!("snapshot of {region} not saved: {error}")
                }
            }
        }
        ticks += 1;
    }
    info!(region = %region, ticks, "yard build finished");
    println!("Build finished in {ticks} ticks ({:.3} s)", t0.elapsed().as_secs_f64());
    println!("  snapshot written to {OUTPUT_DIR}/{REGION}/");

    // 3. Diagnostics.
    let dispatcher = Dispatcher::new(Arc::clone(&catalog), &config);
    for pos in dispatcher.missing_switchers(&region) {
        println!("  missing switcher at {},{},{}", pos.x, pos.y, pos.z);
    }
    println!();

    // 4. Path queries.
    println!("{:<10} {:<10} {:<9} {:<8} Route", "From", "To", "Length", "Cost");
    println!("{}", "-".repeat(60));
    let queries = [
        ("depot", "central", PathOptions::default()),
        ("depot", "north-1", PathOptions::default()),
        ("north-1", "spur-end", PathOptions::objective(Objective::TravelTime)),
        ("depot", "north-1", PathOptions::default().avoiding("j-west")),
    ];
    for (from, to, opts) in &queries {
        let route = match dispatcher.shortest_path(&region, &NodeId::new(*from), &NodeId::new(*to), opts) {
            Some(p) => {
                let hops: Vec<&str> = p.nodes.iter().map(NodeId::as_str).collect();
                format!("{:<9} {:<8} {}", p.total_length, p.cost, hops.join(" → "))
            }
            None => "unreachable".to_owned(),
        };
        println!("{from:<10} {to:<10} {route}");
    }
    println!();

    // 5. Trains contend for track.
    let mut rng = SmallRng::seed_from_u64(SEED);
    let mut trains: Vec<Train> = (0..TRAIN_COUNT)
        .map(|i| Train {
            id:      HolderId::new(format!("T{i}")),
            at:      NodeId::new(STOPS[i % STOPS.len()]),
            running: None,
        })
        .collect();

    let ledger = dispatcher.occupancy(&region);
    let graph = catalog.graph(&region).context("yard graph missing after build")?;
    let mut granted = 0usize;
    let mut held = 0usize;
    for round in 0..ROUNDS {
        let now = Timestamp(round * ROUND_MS);

        for train in trains.iter_mut() {
            if let Some((path, arrives)) = &train.running {
                if *arrives > now {
                    continue;
                }
                let freed = ledger.release_by_train(&train.id, now);
                if let Some(dest) = path.nodes.last() {
                    println!("[{:>6} ms] {} arrived at {dest}, freed {freed}", now.0, train.id);
                    train.at = dest.clone();
                }
                train.running = None;
            }

            let dest = NodeId::new(STOPS[rng.gen_range(0..STOPS.len())]);
            if dest == train.at {
                continue;
            }
            let Some(path) = dispatcher.shortest_path(&region, &train.at, &dest, &PathOptions::default())
            else {
                continue;
            };
            let decision = dispatcher.reserve_path(&region, &train.id, &path, now)?;
            if decision.allowed {
                let travel: u64 = path
                    .edges
                    .iter()
                    .filter_map(|k| graph.edge_by_key(k))
                    .map(|e| e.travel_time_ms())
                    .sum();
                println!(
                    "[{:>6} ms] {} {} → {dest} ({} cells, {travel} ms)",
                    now.0, train.id, decision.aspect, path.total_length
                );
                train.running = Some((path, now.plus_ms(travel)));
                granted += 1;
            } else {
                println!(
                    "[{:>6} ms] {} {} for {dest}: {} blocker(s), earliest {} ms",
                    now.0,
                    train.id,
                    decision.aspect,
                    decision.blockers.len(),
                    decision.earliest.0
                );
                held += 1;
            }
        }
        ledger.purge_expired(now);
    }

    // 6. Summary.
    println!();
    println!("Reservations granted: {granted}  |  held at signal: {held}");
    println!("Live claims at end: {}", ledger.live_count());
    Ok(())
}
