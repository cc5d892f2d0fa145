//! Single-step legality.
//!
//! Every consumer of the grid (flood fill, hop selection, goal search) asks
//! the same question: may an agent standing on `from` take `step`?  The
//! answer is yes when
//!
//! 1. the target cell lies inside the bounds,
//! 2. the target cell is not blocked, and
//! 3. for a diagonal step, neither orthogonal cell adjacent to the move is
//!    blocked (no corner-cutting, even if the diagonal target is free).

use gf_core::{GridBounds, GridCoord, Step};

use crate::ObstacleQuery;

/// `true` if a diagonal `step` from `from` would squeeze past a blocked
/// orthogonal cell.  Always `false` for orthogonal steps.
#[inline]
pub fn cuts_corner<O>(obstacles: &O, from: GridCoord, step: Step) -> bool
where
    O: ObstacleQuery + ?Sized,
{
    if !step.is_diagonal() {
        return false;
    }
    let (horizontal, vertical) = step.orthogonal_parts();
    obstacles.is_blocked(from.offset(horizontal)) || obstacles.is_blocked(from.offset(vertical))
}

/// Full legality check for one step (see module docs).
#[inline]
pub fn can_step<O>(bounds: &GridBounds, obstacles: &O, from: GridCoord, step: Step) -> bool
where
    O: ObstacleQuery + ?Sized,
{
    let to = from.offset(step);
    bounds.contains(to) && !obstacles.is_blocked(to) && !cuts_corner(obstacles, from, step)
}
