//! CSV marker loader.
//!
//! # CSV format
//!
//! One row per marker.  Empty optional fields are allowed.
//!
//! ```csv
//! region,id,type,x,y,z,destination,operator,name,platform
//! main,central-1,station,120,64,-30,,RLX,Central,1
//! main,yard,depot,40,64,-30,,RLX,North Yard,3
//! main,j-north,switcher,80,64,-30,north,,,
//! main,wp-7,waypoint,200,66,-30,,,,
//! ```
//!
//! **`type`** is parsed case-insensitively from
//! `waypoint | station | depot | switcher`.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use rd_core::{CellPos, RegionId};
use rd_graph::{NodeMeta, NodeType};

use crate::marker::{MarkerTable, NodeDefinition};
use crate::BuildError;

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct MarkerRecord {
    region:      String,
    id:          String,
    #[serde(rename = "type")]
    node_type:   String,
    x:           i32,
    y:           i32,
    z:           i32,
    destination: Option<String>,
    operator:    Option<String>,
    name:        Option<String>,
    platform:    Option<u16>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a [`MarkerTable`] from a CSV file.
pub fn load_markers_csv(path: &Path) -> Result<MarkerTable, BuildError> {
    let file = std::fs::File::open(path).map_err(BuildError::Io)?;
    load_markers_reader(file)
}

/// Like [`load_markers_csv`] but accepts any `Read` source.
///
/// Useful for testing (pass a `std::io::Cursor`) or for markers embedded in
/// a save file.
pub fn load_markers_reader<R: Read>(reader: R) -> Result<MarkerTable, BuildError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut table = MarkerTable::new();

    for (line, result) in csv_reader.deserialize::<MarkerRecord>().enumerate() {
        let row = result.map_err(|e| BuildError::Parse(e.to_string()))?;
        let node_type: NodeType = row.node_type.parse().map_err(|e| {
            BuildError::Parse(format!("row {}: {e}", line + 1))
        })?;

        let mut def = NodeDefinition::new(row.id, node_type, CellPos::new(row.x, row.y, row.z));
        def.destination = non_empty(row.destination);
        let meta = NodeMeta {
            operator: non_empty(row.operator),
            name:     non_empty(row.name),
            platform: row.platform,
        };
        if !meta.is_empty() {
            def.meta = Some(meta);
        }
        table.insert(RegionId::new(row.region), def);
    }

    Ok(table)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.is_empty())
}
