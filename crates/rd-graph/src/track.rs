//! Track Cell Access: the connectivity oracle supplied by the host.
//!
//! Topology discovery and the multi-source explorer only ever talk to the
//! physical world through [`TrackCells`].  A game server implements it over
//! its block storage; [`TrackGrid`] is the in-memory implementation used by
//! tests, offline tooling and the demo.
//!
//! # Spatial index
//!
//! `TrackGrid` keeps an R-tree (via `rstar`) of its cells next to the hash
//! set, so nearest-cell queries for marker snapping do not scan the grid.

use rstar::RTree;
use rustc_hash::FxHashSet;

use rd_core::CellPos;

// ── TrackCells ────────────────────────────────────────────────────────────────

/// Low-level connectivity over physical track cells.
pub trait TrackCells {
    /// `true` if `pos` holds a piece of track.
    fn is_track(&self, pos: CellPos) -> bool;

    /// Track cells directly connected to `pos`.
    fn neighbors(&self, pos: CellPos) -> Vec<CellPos>;

    /// The track cells nearest to `pos` within `radius` cells (Euclidean).
    ///
    /// Returns every cell tied at the minimum distance, sorted by position,
    /// so a marker sitting between two parallel tracks anchors to both.
    /// Empty if no track lies within `radius`.
    fn find_nearest_track_cells(&self, pos: CellPos, radius: u32) -> Vec<CellPos>;
}

impl<T: TrackCells + ?Sized> TrackCells for &T {
    fn is_track(&self, pos: CellPos) -> bool {
        (**self).is_track(pos)
    }

    fn neighbors(&self, pos: CellPos) -> Vec<CellPos> {
        (**self).neighbors(pos)
    }

    fn find_nearest_track_cells(&self, pos: CellPos, radius: u32) -> Vec<CellPos> {
        (**self).find_nearest_track_cells(pos, radius)
    }
}

// ── TrackGrid ─────────────────────────────────────────────────────────────────

/// Horizontal connection directions `(dx, dz)`.
const HORIZONTAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// In-memory track layout.
///
/// Connectivity: a cell connects to the four horizontally adjacent cells at
/// the same level and to those one level up or down (slopes).
///
/// # Example
///
/// ```
/// use rd_core::CellPos;
/// use rd_graph::{TrackCells, TrackGrid};
///
/// let mut grid = TrackGrid::new();
/// grid.add_line(CellPos::new(0, 64, 0), CellPos::new(10, 64, 0));
/// assert_eq!(grid.len(), 11);
/// assert_eq!(grid.neighbors(CellPos::new(5, 64, 0)).len(), 2);
/// ```
#[derive(Default)]
pub struct TrackGrid {
    cells:       FxHashSet<CellPos>,
    spatial_idx: RTree<[f64; 3]>,
}

impl TrackGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Mark `pos` as track.  Returns `false` if it already was.
    pub fn add_cell(&mut self, pos: CellPos) -> bool {
        if !self.cells.insert(pos) {
            return false;
        }
        self.spatial_idx.insert(point(pos));
        true
    }

    /// Remove the track at `pos`.  Returns `false` if there was none.
    pub fn remove_cell(&mut self, pos: CellPos) -> bool {
        if !self.cells.remove(&pos) {
            return false;
        }
        self.spatial_idx.remove(&point(pos));
        true
    }

    /// Lay a straight run of track from `from` to `to`, both inclusive.
    ///
    /// The run moves along x first, then z; when `y` differs it climbs or
    /// descends one level per horizontal step until it reaches `to.y`.
    /// Returns the number of newly added cells.
    pub fn add_line(&mut self, from: CellPos, to: CellPos) -> usize {
        let mut added = usize::from(self.add_cell(from));
        let mut cur = from;
        while cur != to {
            let dy = (to.y - cur.y).signum();
            if cur.x != to.x {
                cur = cur.offset((to.x - cur.x).signum(), dy, 0);
            } else if cur.z != to.z {
                cur = cur.offset(0, dy, (to.z - cur.z).signum());
            } else {
                cur = cur.offset(0, dy, 0);
            }
            added += usize::from(self.add_cell(cur));
        }
        added
    }

    /// Lay track through consecutive `waypoints`.
    pub fn add_path(&mut self, waypoints: &[CellPos]) -> usize {
        waypoints.windows(2).map(|w| self.add_line(w[0], w[1])).sum()
    }

    pub fn cells(&self) -> impl Iterator<Item = &CellPos> + '_ {
        self.cells.iter()
    }
}

impl TrackCells for TrackGrid {
    fn is_track(&self, pos: CellPos) -> bool {
        self.cells.contains(&pos)
    }

    fn neighbors(&self, pos: CellPos) -> Vec<CellPos> {
        let mut out = Vec::with_capacity(4);
        for (dx, dz) in HORIZONTAL {
            for dy in [0, 1, -1] {
                let n = pos.offset(dx, dy, dz);
                if self.cells.contains(&n) {
                    out.push(n);
                }
            }
        }
        out
    }

    fn find_nearest_track_cells(&self, pos: CellPos, radius: u32) -> Vec<CellPos> {
        let max_d2 = (radius as f64) * (radius as f64);
        let mut iter = self
            .spatial_idx
            .nearest_neighbor_iter_with_distance_2(&point(pos));

        let Some((first, best)) = iter.next() else {
            return Vec::new();
        };
        if best > max_d2 {
            return Vec::new();
        }

        let mut out = vec![from_point(first)];
        out.extend(
            iter.take_while(|(_, d2)| *d2 <= best)
                .map(|(p, _)| from_point(p)),
        );
        out.sort_unstable();
        out
    }
}

#[inline]
fn point(pos: CellPos) -> [f64; 3] {
    [pos.x as f64, pos.y as f64, pos.z as f64]
}

#[inline]
fn from_point(p: &[f64; 3]) -> CellPos {
    CellPos::new(p[0] as i32, p[1] as i32, p[2] as i32)
}
