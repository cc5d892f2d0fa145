//! Grid coordinate types and neighborhood definitions.
//!
//! `GridCoord` is an absolute integer cell address.  Every grid-backed
//! structure interprets it relative to a `GridBounds` (origin, width,
//! height), which also owns the row-major `coord ↔ index` mapping used for
//! dense per-cell arrays.

use std::fmt;

use crate::{GfError, GfResult};

// ── GridCoord ─────────────────────────────────────────────────────────────────

/// An absolute integer cell coordinate.
///
/// `Ord` is row-major (`y` first, then `x`) so sorted collections of cells
/// iterate in the same order as dense per-cell arrays.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell reached by taking `step` from `self`.  Wraps at the `i32`
    /// edge; a wrapped cell is never inside any [`GridBounds`].
    #[inline]
    pub fn offset(self, step: Step) -> GridCoord {
        GridCoord::new(self.x.wrapping_add(step.dx), self.y.wrapping_add(step.dy))
    }

    /// Chebyshev distance — number of 8-directional hops between two cells
    /// on an open grid.
    #[inline]
    pub fn chebyshev(self, other: GridCoord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl PartialOrd for GridCoord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GridCoord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for GridCoord {
    #[inline]
    fn from((x, y): (i32, i32)) -> Self {
        GridCoord::new(x, y)
    }
}

// ── Step / Connectivity ───────────────────────────────────────────────────────

/// A single-cell move.  Orthogonal steps cost 1, diagonal steps cost √2.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    pub dx: i32,
    pub dy: i32,
}

impl Step {
    pub const EAST:       Step = Step { dx:  1, dy:  0 };
    pub const WEST:       Step = Step { dx: -1, dy:  0 };
    pub const NORTH:      Step = Step { dx:  0, dy:  1 };
    pub const SOUTH:      Step = Step { dx:  0, dy: -1 };
    pub const NORTH_EAST: Step = Step { dx:  1, dy:  1 };
    pub const SOUTH_EAST: Step = Step { dx:  1, dy: -1 };
    pub const NORTH_WEST: Step = Step { dx: -1, dy:  1 };
    pub const SOUTH_WEST: Step = Step { dx: -1, dy: -1 };

    #[inline]
    pub fn is_diagonal(self) -> bool {
        self.dx != 0 && self.dy != 0
    }

    /// Edge cost of taking this step.
    #[inline]
    pub fn cost(self) -> f32 {
        if self.is_diagonal() { std::f32::consts::SQRT_2 } else { 1.0 }
    }

    /// The two orthogonal components of a diagonal step (`(dx, 0)` and
    /// `(0, dy)`).  A diagonal move is only legal when both cells reached by
    /// these components are free.
    #[inline]
    pub fn orthogonal_parts(self) -> (Step, Step) {
        (Step { dx: self.dx, dy: 0 }, Step { dx: 0, dy: self.dy })
    }
}

/// Fixed neighbor ordering shared by the flood fill, the direction field,
/// hop selection and goal assignment.  Orthogonals first, then diagonals.
const NEIGHBORS_8: [Step; 8] = [
    Step::EAST,
    Step::WEST,
    Step::NORTH,
    Step::SOUTH,
    Step::NORTH_EAST,
    Step::SOUTH_EAST,
    Step::NORTH_WEST,
    Step::SOUTH_WEST,
];

/// Movement neighborhood.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Connectivity {
    /// Orthogonal moves only; every edge costs 1.
    Four,
    /// Orthogonal + diagonal moves; diagonals cost √2 and may not cut corners.
    #[default]
    Eight,
}

impl Connectivity {
    /// Neighbor offsets in the canonical order: E, W, N, S, then NE, SE, NW, SW.
    #[inline]
    pub fn steps(self) -> &'static [Step] {
        match self {
            Connectivity::Four  => &NEIGHBORS_8[..4],
            Connectivity::Eight => &NEIGHBORS_8,
        }
    }

    /// `true` when every edge has the same cost, so a FIFO frontier yields
    /// exact distances.
    #[inline]
    pub fn is_uniform(self) -> bool {
        matches!(self, Connectivity::Four)
    }
}

// ── GridBounds ────────────────────────────────────────────────────────────────

/// A non-empty rectangular region of cells: `origin` is the lowest-x,
/// lowest-y cell; the region spans `width × height` cells.
///
/// Every cell of the region and its eight neighbours are representable as
/// `GridCoord`s, so stepping off any in-bounds cell never overflows.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "BoundsSpec"))]
pub struct GridBounds {
    origin: GridCoord,
    width:  i32,
    height: i32,
}

impl GridBounds {
    /// Create a region of `width × height` cells starting at `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`GfError::InvalidBounds`] if either dimension is not positive,
    /// or if the region (plus a one-cell border) does not fit in `i32`.
    pub fn new(origin: GridCoord, width: i32, height: i32) -> GfResult<Self> {
        let fits = |start: i32, len: i32| start > i32::MIN && start.checked_add(len).is_some();
        if width <= 0 || height <= 0 || !fits(origin.x, width) || !fits(origin.y, height) {
            return Err(GfError::InvalidBounds { width, height });
        }
        Ok(Self { origin, width, height })
    }

    #[inline]
    pub fn origin(&self) -> GridCoord {
        self.origin
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Highest-x, highest-y cell inside the region.
    #[inline]
    pub fn max(&self) -> GridCoord {
        GridCoord::new(self.origin.x + self.width - 1, self.origin.y + self.height - 1)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn contains(&self, cell: GridCoord) -> bool {
        let rx = i64::from(cell.x) - i64::from(self.origin.x);
        let ry = i64::from(cell.y) - i64::from(self.origin.y);
        rx >= 0 && ry >= 0 && rx < i64::from(self.width) && ry < i64::from(self.height)
    }

    /// Nearest in-bounds cell (per-axis clamp).
    #[inline]
    pub fn clamp(&self, cell: GridCoord) -> GridCoord {
        let max = self.max();
        GridCoord::new(
            cell.x.clamp(self.origin.x, max.x),
            cell.y.clamp(self.origin.y, max.y),
        )
    }

    /// Row-major index of `cell`, or `None` if it lies outside the region.
    #[inline]
    pub fn index(&self, cell: GridCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let rx = (cell.x - self.origin.x) as usize;
        let ry = (cell.y - self.origin.y) as usize;
        Some(ry * self.width as usize + rx)
    }

    /// Inverse of [`index`][Self::index].  `idx` must be `< cell_count()`.
    #[inline]
    pub fn coord_at(&self, idx: usize) -> GridCoord {
        let w = self.width as usize;
        GridCoord::new(
            self.origin.x + (idx % w) as i32,
            self.origin.y + (idx / w) as i32,
        )
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.cell_count()).map(|i| self.coord_at(i))
    }
}

/// Unvalidated bounds fields; converting runs the [`GridBounds::new`] checks.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct BoundsSpec {
    pub origin: GridCoord,
    pub width:  i32,
    pub height: i32,
}

impl TryFrom<BoundsSpec> for GridBounds {
    type Error = GfError;

    fn try_from(spec: BoundsSpec) -> GfResult<Self> {
        GridBounds::new(spec.origin, spec.width, spec.height)
    }
}

impl fmt::Display for GridBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}x{}", self.origin, self.width, self.height)
    }
}
