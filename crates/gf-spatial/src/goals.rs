//! Distinct goal-cell discovery around a requested destination.

use std::collections::VecDeque;

use fixedbitset::FixedBitSet;

use gf_core::{Connectivity, GridBounds, GridCoord};

use crate::{ObstacleQuery, moves};

/// Collect up to `count` distinct free cells around `origin`.
///
/// `origin` is first clamped into `bounds`.  A breadth-first search then
/// expands from it in the fixed [`Connectivity::steps`] order, only
/// traversing legal steps (free target, no corner-cutting), and collects
/// every free cell it dequeues.  When the clamped origin is free it is
/// always the first element.
///
/// The result is shorter than `count` when the connected free region around
/// `origin` holds fewer cells.  This function is pure: it owns all of its
/// search state, so calling it twice with the same inputs yields the same
/// cells in the same order.
pub fn assign_goals<O>(
    origin:       GridCoord,
    bounds:       &GridBounds,
    connectivity: Connectivity,
    obstacles:    &O,
    count:        usize,
) -> Vec<GridCoord>
where
    O: ObstacleQuery + ?Sized,
{
    let mut goals = Vec::with_capacity(count);
    if count == 0 {
        return goals;
    }

    let origin = bounds.clamp(origin);
    let mut visited = FixedBitSet::with_capacity(bounds.cell_count());
    let mut queue = VecDeque::new();

    if let Some(idx) = bounds.index(origin) {
        visited.insert(idx);
        queue.push_back(origin);
    }

    while let Some(cell) = queue.pop_front() {
        if !obstacles.is_blocked(cell) {
            goals.push(cell);
            if goals.len() == count {
                break;
            }
        }

        for &step in connectivity.steps() {
            if !moves::can_step(bounds, obstacles, cell, step) {
                continue;
            }
            let next = cell.offset(step);
            if let Some(idx) = bounds.index(next) {
                if !visited.put(idx) {
                    queue.push_back(next);
                }
            }
        }
    }

    goals
}
