//! Hex coordinate system using axial coordinates (q, r).
//!
//! This module provides the foundational coordinate types for the hex-based game board:
//! - `HexCoord`: Identifies individual hex cells
//! - `EdgeCoord`: Identifies the border between two adjacent cells, where conduits are built
//! - `HexGrid`: The hexagonal region of cells that makes up a board
//!
//! We use axial coordinates because they make neighbor calculations elegant and
//! avoid the wasted space of offset coordinates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The six axial direction offsets, in the order neighbors are reported.
pub const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (0, 1), (-1, 1), (-1, 0), (0, -1), (1, -1)];

/// Axial coordinate for hex grid.
///
/// In axial coordinates:
/// - `q` increases going east (right)
/// - `r` increases going southeast
/// - The third coordinate `s` (not stored) satisfies: q + r + s = 0
///
/// Ordering is lexicographic on (q, r), which is also the order the grid
/// generates cells in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct HexCoord {
    /// Column (increases going east)
    pub q: i32,
    /// Row (increases going southeast)
    pub r: i32,
}

impl HexCoord {
    /// The board center, where the Nexus sits
    pub const CENTER: HexCoord = HexCoord::new(0, 0);

    /// Create a new hex coordinate
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third coordinate (s = -q - r)
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// The six surrounding coordinates, whether or not they are on a grid
    pub fn neighbors(&self) -> [HexCoord; 6] {
        DIRECTIONS.map(|(dq, dr)| HexCoord::new(self.q + dq, self.r + dr))
    }

    /// Whether `other` is one step away
    pub fn is_neighbor(&self, other: &HexCoord) -> bool {
        self.distance_to(other) == 1
    }

    /// Distance to another hex (in hex steps)
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = (self.q - other.q).unsigned_abs();
        let dr = (self.r - other.r).unsigned_abs();
        let ds = (self.s() - other.s()).unsigned_abs();
        dq.max(dr).max(ds)
    }

    /// Distance to the center cell
    pub fn distance_from_center(&self) -> u32 {
        self.distance_to(&HexCoord::CENTER)
    }
}

impl From<(i32, i32)> for HexCoord {
    fn from((q, r): (i32, i32)) -> Self {
        HexCoord::new(q, r)
    }
}

/// Edge coordinate - the border shared by two cells.
///
/// Stored as a sorted pair so that (A, B) and (B, A) are the same key. The
/// constructor does not check adjacency; that depends on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeCoord {
    a: HexCoord,
    b: HexCoord,
}

impl EdgeCoord {
    /// Create a new edge coordinate (automatically canonicalized)
    pub fn new(a: HexCoord, b: HexCoord) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }

    /// Both endpoints, smaller first
    pub fn endpoints(&self) -> [HexCoord; 2] {
        [self.a, self.b]
    }

    /// Whether `cell` is one of the endpoints
    pub fn touches(&self, cell: &HexCoord) -> bool {
        self.a == *cell || self.b == *cell
    }

    /// Whether the two edges share an endpoint
    pub fn shares_endpoint(&self, other: &EdgeCoord) -> bool {
        other.touches(&self.a) || other.touches(&self.b)
    }

    /// The endpoint opposite `cell`, if `cell` is on this edge
    #[cfg(test)]
    pub fn other_end(&self, cell: &HexCoord) -> Option<HexCoord> {
        if self.a == *cell {
            Some(self.b)
        } else if self.b == *cell {
            Some(self.a)
        } else {
            None
        }
    }
}

/// A hexagonal region of cells around the origin.
///
/// Contains every (q, r) where q, r and s all lie in `[-radius, radius]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexGrid {
    radius: u32,
    cells: BTreeSet<HexCoord>,
}

impl HexGrid {
    /// Generate every cell within `radius` steps of the center
    pub fn new(radius: u32) -> Self {
        let n = radius as i32;
        let mut cells = BTreeSet::new();
        for q in -n..=n {
            for r in -n..=n {
                if (-q - r).abs() <= n {
                    cells.insert(HexCoord::new(q, r));
                }
            }
        }
        Self { radius, cells }
    }

    /// Number of cells a grid of this radius holds: 3R² + 3R + 1
    #[cfg(test)]
    pub fn expected_size(radius: u32) -> usize {
        let r = radius as usize;
        3 * r * r + 3 * r + 1
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells in (q, r) order
    pub fn cells(&self) -> impl Iterator<Item = &HexCoord> {
        self.cells.iter()
    }

    pub fn contains(&self, coord: &HexCoord) -> bool {
        self.cells.contains(coord)
    }

    /// The on-grid neighbors of `coord`
    pub fn neighbors(&self, coord: &HexCoord) -> Vec<HexCoord> {
        coord
            .neighbors()
            .into_iter()
            .filter(|n| self.contains(n))
            .collect()
    }

    /// Whether both cells exist and touch
    pub fn are_adjacent(&self, a: &HexCoord, b: &HexCoord) -> bool {
        self.contains(a) && self.contains(b) && a.is_neighbor(b)
    }

    /// Cells on the outer ring (distance == radius), in grid order
    pub fn edge_cells(&self) -> Vec<HexCoord> {
        self.cells
            .iter()
            .filter(|c| c.distance_from_center() == self.radius)
            .copied()
            .collect()
    }

    /// Cells strictly inside the outer ring, in grid order
    pub fn interior_cells(&self) -> Vec<HexCoord> {
        self.cells
            .iter()
            .filter(|c| c.distance_from_center() < self.radius)
            .copied()
            .collect()
    }

    /// Every pair of adjacent cells, once each
    pub fn edges(&self) -> Vec<EdgeCoord> {
        let mut edges = Vec::new();
        for cell in &self.cells {
            for neighbor in self.neighbors(cell) {
                if *cell < neighbor {
                    edges.push(EdgeCoord::new(*cell, neighbor));
                }
            }
        }
        edges
    }
}
