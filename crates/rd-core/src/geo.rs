//! Track-cell coordinates.
//!
//! The physical network is a lattice of cells addressed by integer `(x, y, z)`
//! coordinates, with `y` as the vertical axis.  All distances along track are
//! counted in cell steps; the Euclidean helpers here are only used to pick
//! nearby cells when snapping a marker or requester position onto track.

/// A single addressable cell of the world lattice.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The cell displaced by `(dx, dy, dz)`.
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy, z: self.z + dz }
    }

    /// Squared Euclidean distance, in cells².  Exact in `i64`.
    #[inline]
    pub fn distance_sq(self, other: CellPos) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }

    /// Manhattan distance in cells.
    #[inline]
    pub fn manhattan(self, other: CellPos) -> u64 {
        self.x.abs_diff(other.x) as u64
            + self.y.abs_diff(other.y) as u64
            + self.z.abs_diff(other.z) as u64
    }

    /// Coordinates as an array, the layout the spatial index expects.
    #[inline]
    pub const fn to_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub const fn from_array(a: [i32; 3]) -> Self {
        Self { x: a[0], y: a[1], z: a[2] }
    }
}

impl std::fmt::Display for CellPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}
