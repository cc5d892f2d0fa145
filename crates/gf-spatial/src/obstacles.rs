//! Static obstacle queries.

use rustc_hash::FxHashSet;

use gf_core::{GridBounds, GridCoord, SimRng};

use crate::{SpatialError, SpatialResult};

/// Blocked/free test for a single cell.
///
/// Used both for direct target checks and for the corner-cut check on the
/// two orthogonal cells of a diagonal move.  Cells the implementation knows
/// nothing about should report free; bounds are enforced separately.
pub trait ObstacleQuery {
    fn is_blocked(&self, cell: GridCoord) -> bool;
}

/// Any `Fn(GridCoord) -> bool` predicate is an obstacle query, which keeps
/// tests and one-off maps terse: `&|c: GridCoord| c.x == 2`.
impl<F> ObstacleQuery for F
where
    F: Fn(GridCoord) -> bool,
{
    #[inline]
    fn is_blocked(&self, cell: GridCoord) -> bool {
        self(cell)
    }
}

// ── ObstacleMap ───────────────────────────────────────────────────────────────

/// Sparse set of blocked cells.
#[derive(Clone, Debug, Default)]
pub struct ObstacleMap {
    blocked: FxHashSet<GridCoord>,
}

impl ObstacleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&mut self, cell: GridCoord) {
        self.blocked.insert(cell);
    }

    pub fn unblock(&mut self, cell: GridCoord) {
        self.blocked.remove(&cell);
    }

    /// Block every cell in the inclusive rectangle spanned by `a` and `b`.
    pub fn block_rect(&mut self, a: GridCoord, b: GridCoord) {
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for x in a.x.min(b.x)..=a.x.max(b.x) {
                self.blocked.insert(GridCoord::new(x, y));
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }

    /// Blocked cells in row-major order.
    pub fn cells(&self) -> Vec<GridCoord> {
        let mut cells: Vec<GridCoord> = self.blocked.iter().copied().collect();
        cells.sort_unstable();
        cells
    }

    /// Block each in-bounds cell with probability `density`, leaving the
    /// cells in `keep_clear` free.  Deterministic for a given RNG state.
    pub fn scatter(
        &mut self,
        bounds:     &GridBounds,
        density:    f64,
        rng:        &mut SimRng,
        keep_clear: &[GridCoord],
    ) {
        for cell in bounds.cells() {
            if rng.gen_bool(density) && !keep_clear.contains(&cell) {
                self.blocked.insert(cell);
            }
        }
    }

    /// Parse a map drawn as text, one row per line, top row first.
    ///
    /// `#` marks a blocked cell, any other character a free one.  The bottom
    /// row is `y = 0` and the leftmost column `x = 0`.  Blank lines are
    /// skipped; leading/trailing whitespace on each line is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Parse`] for an empty map or rows of unequal
    /// length.
    pub fn from_ascii(text: &str) -> SpatialResult<(ObstacleMap, GridBounds)> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let Some(first) = rows.first() else {
            return Err(SpatialError::Parse("map has no rows".into()));
        };
        let width = first.chars().count();

        let mut map = ObstacleMap::new();
        let height = rows.len();
        for (row, line) in rows.iter().enumerate() {
            if line.chars().count() != width {
                return Err(SpatialError::Parse(format!(
                    "row {row} has {} cells, expected {width}",
                    line.chars().count()
                )));
            }
            let y = (height - 1 - row) as i32;
            for (x, ch) in line.chars().enumerate() {
                if ch == '#' {
                    map.block(GridCoord::new(x as i32, y));
                }
            }
        }

        let bounds = GridBounds::new(GridCoord::new(0, 0), width as i32, height as i32)?;
        Ok((map, bounds))
    }
}

impl ObstacleQuery for ObstacleMap {
    #[inline]
    fn is_blocked(&self, cell: GridCoord) -> bool {
        self.blocked.contains(&cell)
    }
}
