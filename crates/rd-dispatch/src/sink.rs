//! Snapshot persistence hook.
//!
//! After a build is published, the driver hands the snapshot to an optional
//! [`SnapshotSink`].  A failing sink never touches the catalog: the
//! in-memory snapshot is already live and stays so.
//!
//! [`CsvSnapshotSink`] creates one directory per region holding:
//! - `nodes.csv`
//! - `edges.csv`

use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;

use rd_core::RegionId;
use rd_graph::RailGraph;

use crate::catalog::BuildReport;
use crate::DispatchResult;

/// Receives every published snapshot.
pub trait SnapshotSink: Send {
    fn save(&mut self, graph: &RailGraph, report: &BuildReport) -> DispatchResult<()>;
}

/// Writes each region's snapshot as two CSV files under `root/<region>/`.
pub struct CsvSnapshotSink {
    root: PathBuf,
}

impl CsvSnapshotSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn region_dir(&self, region: &RegionId) -> PathBuf {
        self.root.join(region.as_str())
    }
}

impl SnapshotSink for CsvSnapshotSink {
    fn save(&mut self, graph: &RailGraph, report: &BuildReport) -> DispatchResult<()> {
        let dir = self.region_dir(&report.region);
        fs::create_dir_all(&dir)?;
        write_nodes(&dir, graph)?;
        write_edges(&dir, graph)?;
        Ok(())
    }
}

fn write_nodes(dir: &Path, graph: &RailGraph) -> DispatchResult<()> {
    let mut w = Writer::from_path(dir.join("nodes.csv"))?;
    w.write_record(["id", "type", "x", "y", "z", "destination", "operator", "name", "platform"])?;
    for node in graph.nodes() {
        let meta = node.meta.clone().unwrap_or_default();
        w.write_record(&[
            node.id().to_string(),
            node.node_type.to_string(),
            node.pos.x.to_string(),
            node.pos.y.to_string(),
            node.pos.z.to_string(),
            node.destination.clone().unwrap_or_default(),
            meta.operator.unwrap_or_default(),
            meta.name.unwrap_or_default(),
            meta.platform.map(|p| p.to_string()).unwrap_or_default(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_edges(dir: &Path, graph: &RailGraph) -> DispatchResult<()> {
    let mut w = Writer::from_path(dir.join("edges.csv"))?;
    w.write_record(["from", "to", "length", "speed_limit", "bidirectional"])?;
    for edge in graph.edges() {
        w.write_record(&[
            edge.from.to_string(),
            edge.to.to_string(),
            edge.length.to_string(),
            edge.speed_limit.to_string(),
            (edge.bidirectional as u8).to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}
