//! Synthetic yard used by the demo.
//!
//! ```text
//!                         north-1 (100,30)
//!                  ┌──────────────┘
//!                  │
//!   depot ─────── j-west ────── wp-mid ──────┬────── central
//!   (0,0)        (40,0)        (70,0)        │ (90,0)   (120,0)
//!                                            └── spur-end (90,-15)
//! ```
//!
//! `j-west` is a configured switcher.  The branch at x=90 has none, so the
//! build reports it as a missing switcher.

use std::io::Cursor;

use anyhow::Result;

use rd_build::{MarkerTable, load_markers_reader};
use rd_core::CellPos;
use rd_graph::TrackGrid;

pub const REGION: &str = "yard";

const MARKERS_CSV: &str = "\
region,id,type,x,y,z,destination,operator,name,platform
yard,depot,depot,0,65,0,,RLX,West Depot,1
yard,j-west,switcher,40,65,0,north,,,
yard,wp-mid,waypoint,70,65,0,,,,
yard,central,station,120,65,0,,RLX,Central,2
yard,north-1,station,100,65,30,,RLX,North,1
yard,spur-end,waypoint,90,65,-15,,,,
";

fn cell(x: i32, z: i32) -> CellPos {
    CellPos::new(x, 64, z)
}

/// Track layout and the markers placed along it.
pub fn build_yard() -> Result<(TrackGrid, MarkerTable)> {
    let mut grid = TrackGrid::new();
    grid.add_line(cell(0, 0), cell(120, 0));
    grid.add_path(&[cell(40, 1), cell(40, 30), cell(100, 30)]);
    grid.add_line(cell(90, -1), cell(90, -15));

    let markers = load_markers_reader(Cursor::new(MARKERS_CSV))?;
    Ok((grid, markers))
}
