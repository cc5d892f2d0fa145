//! Flow-field generation: an outward flood fill from one goal cell.
//!
//! # Algorithm
//!
//! 1. **Cost field:** every cell starts at `+∞`, the goal at `0`.  A flood
//!    fill expands outward from the goal, relaxing each legal neighbor with
//!    `cost + step.cost()`.  With 4-connectivity every edge costs 1 and a
//!    FIFO frontier yields exact distances; with 8-connectivity diagonals
//!    cost √2, so the frontier is a min-heap keyed on `(cost, cell index)`.
//! 2. **Direction field:** every cell points (unit vector) at the first
//!    neighbor, in the fixed [`Connectivity::steps`] order, whose cost is
//!    strictly lower than its own and which is reachable without cutting a
//!    corner.  The goal, blocked cells and unreachable cells get `Vec2::ZERO`.
//!
//! Obstacles are sampled once per [`FlowField::generate`] into a bitset, so
//! the cost field, direction field and [`FlowField::path`] always agree with
//! each other even if the obstacle source changes later.
//!
//! # Performance
//!
//! - **Generation:** O(cells × branching × log cells) for the heap frontier,
//!   O(cells × branching) for FIFO.
//! - **Query:** O(1) array lookup.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use fixedbitset::FixedBitSet;
use glam::Vec2;
use ordered_float::OrderedFloat;
use tracing::debug;

use gf_core::{Connectivity, GridBounds, GridCoord, Step};

use crate::{GridGeometry, ObstacleQuery};

// ── Frontier ──────────────────────────────────────────────────────────────────

/// Open set of the flood fill.  Entries carry the cost they were pushed
/// with so stale heap entries can be skipped on pop.
enum Frontier {
    Fifo(VecDeque<(f32, usize)>),
    // Secondary key (cell index) gives deterministic tie-breaking.
    Heap(BinaryHeap<Reverse<(OrderedFloat<f32>, usize)>>),
}

impl Frontier {
    fn for_connectivity(connectivity: Connectivity) -> Self {
        if connectivity.is_uniform() {
            Frontier::Fifo(VecDeque::new())
        } else {
            Frontier::Heap(BinaryHeap::new())
        }
    }

    fn push(&mut self, cost: f32, idx: usize) {
        match self {
            Frontier::Fifo(q) => q.push_back((cost, idx)),
            Frontier::Heap(h) => h.push(Reverse((OrderedFloat(cost), idx))),
        }
    }

    fn pop(&mut self) -> Option<(f32, usize)> {
        match self {
            Frontier::Fifo(q) => q.pop_front(),
            Frontier::Heap(h) => h.pop().map(|Reverse((c, idx))| (c.0, idx)),
        }
    }
}

// ── FlowField ─────────────────────────────────────────────────────────────────

/// Cost and direction fields toward a single goal over a bounded region.
///
/// A field is built once per goal and then shared read-only (typically via
/// `Arc`) by every agent heading to that goal.
#[derive(Clone, Debug)]
pub struct FlowField {
    bounds:       GridBounds,
    connectivity: Connectivity,
    goal:         Option<GridCoord>,
    /// Obstacle snapshot taken by the last `generate`.
    blocked:      FixedBitSet,
    /// Distance to goal, row-major.  `f32::INFINITY` = unreachable.
    costs:        Vec<f32>,
    /// Unit direction toward a lower-cost neighbor, or zero.
    directions:   Vec<Vec2>,
}

impl FlowField {
    /// An ungenerated field: every cost is `+∞`, every direction zero.
    pub fn new(bounds: GridBounds, connectivity: Connectivity) -> Self {
        let n = bounds.cell_count();
        Self {
            bounds,
            connectivity,
            goal:       None,
            blocked:    FixedBitSet::with_capacity(n),
            costs:      vec![f32::INFINITY; n],
            directions: vec![Vec2::ZERO; n],
        }
    }

    #[inline]
    pub fn bounds(&self) -> &GridBounds {
        &self.bounds
    }

    #[inline]
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Goal of the last successful `generate`, if any.
    #[inline]
    pub fn goal(&self) -> Option<GridCoord> {
        self.goal
    }

    /// Rebuild both fields toward `goal`.
    ///
    /// If `goal` lies outside the bounds nothing changes and `false` is
    /// returned; the field keeps whatever it held before.  Callers decide
    /// reachability with [`cost`][Self::cost].
    pub fn generate<O>(&mut self, goal: GridCoord, obstacles: &O) -> bool
    where
        O: ObstacleQuery + ?Sized,
    {
        let Some(goal_idx) = self.bounds.index(goal) else {
            debug!(%goal, bounds = %self.bounds, "flow field goal out of bounds; field left unchanged");
            return false;
        };

        self.snapshot_obstacles(obstacles);
        self.costs.fill(f32::INFINITY);
        self.costs[goal_idx] = 0.0;
        self.goal = Some(goal);

        let mut frontier = Frontier::for_connectivity(self.connectivity);
        frontier.push(0.0, goal_idx);
        let mut reached = 1usize;

        while let Some((cost, idx)) = frontier.pop() {
            // Skip stale entries superseded by a cheaper relaxation.
            if cost > self.costs[idx] {
                continue;
            }
            let cell = self.bounds.coord_at(idx);

            for &step in self.connectivity.steps() {
                let Some(n_idx) = self.bounds.index(cell.offset(step)) else {
                    continue;
                };
                if self.blocked.contains(n_idx) || self.cuts_corner(cell, step) {
                    continue;
                }
                let new_cost = cost + step.cost();
                if new_cost < self.costs[n_idx] {
                    if self.costs[n_idx].is_infinite() {
                        reached += 1;
                    }
                    self.costs[n_idx] = new_cost;
                    frontier.push(new_cost, n_idx);
                }
            }
        }

        self.build_directions();

        debug!(
            %goal,
            reached,
            cells = self.bounds.cell_count(),
            connectivity = ?self.connectivity,
            "flow field generated"
        );
        true
    }

    /// Recorded cost of `cell`; `+∞` if out of bounds, unreachable, or the
    /// field was never generated.
    #[inline]
    pub fn cost(&self, cell: GridCoord) -> f32 {
        self.bounds
            .index(cell)
            .map_or(f32::INFINITY, |i| self.costs[i])
    }

    /// `true` if `cell` has a finite cost.
    #[inline]
    pub fn is_reachable(&self, cell: GridCoord) -> bool {
        self.cost(cell).is_finite()
    }

    /// `true` if an agent standing on `cell` can still make its way to the
    /// goal: `cell` is the goal, or a corner-safe neighbor has a finite cost.
    /// Unlike [`is_reachable`][Self::is_reachable] this holds for a blocked
    /// cell next to open ground.
    pub fn can_progress(&self, cell: GridCoord) -> bool {
        self.goal == Some(cell)
            || self.connectivity.steps().iter().any(|&step| {
                self.is_reachable(cell.offset(step)) && !self.cuts_corner(cell, step)
            })
    }

    /// Direction-field vector at `cell`; zero if out of bounds.
    #[inline]
    pub fn direction(&self, cell: GridCoord) -> Vec2 {
        self.bounds
            .index(cell)
            .map_or(Vec2::ZERO, |i| self.directions[i])
    }

    /// Direction-field vector under a world-space point.
    #[inline]
    pub fn direction_at_world<G>(&self, point: Vec2, geometry: &G) -> Vec2
    where
        G: GridGeometry + ?Sized,
    {
        self.direction(geometry.world_to_cell(point))
    }

    /// Greedy descent from `start`: repeatedly move to the lowest-cost legal
    /// neighbor whose cost is strictly lower than the current cell's, until
    /// `goal` is reached or no neighbor improves.
    ///
    /// The returned sequence always begins with `start` and may end short of
    /// `goal` (for an unreachable start it is just `[start]`).  At most
    /// `width × height` steps are taken.
    pub fn path(&self, start: GridCoord, goal: GridCoord) -> Vec<GridCoord> {
        let mut path = vec![start];
        let mut cur = start;

        for _ in 0..self.bounds.cell_count() {
            if cur == goal {
                break;
            }
            match self.steepest_descent(cur) {
                Some(next) => {
                    path.push(next);
                    cur = next;
                }
                None => break,
            }
        }
        path
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn snapshot_obstacles<O>(&mut self, obstacles: &O)
    where
        O: ObstacleQuery + ?Sized,
    {
        self.blocked.clear();
        for idx in 0..self.bounds.cell_count() {
            if obstacles.is_blocked(self.bounds.coord_at(idx)) {
                self.blocked.insert(idx);
            }
        }
    }

    #[inline]
    fn is_blocked(&self, cell: GridCoord) -> bool {
        self.bounds
            .index(cell)
            .is_some_and(|i| self.blocked.contains(i))
    }

    /// Corner-cut test against the snapshot.  Both orthogonal cells of an
    /// in-bounds diagonal move are themselves in bounds.
    #[inline]
    fn cuts_corner(&self, from: GridCoord, step: Step) -> bool {
        if !step.is_diagonal() {
            return false;
        }
        let (horizontal, vertical) = step.orthogonal_parts();
        self.is_blocked(from.offset(horizontal)) || self.is_blocked(from.offset(vertical))
    }

    fn build_directions(&mut self) {
        for idx in 0..self.bounds.cell_count() {
            let own = self.costs[idx];
            if !own.is_finite() {
                self.directions[idx] = Vec2::ZERO;
                continue;
            }
            let cell = self.bounds.coord_at(idx);

            let dir = self
                .connectivity
                .steps()
                .iter()
                .find(|&&step| {
                    self.cost(cell.offset(step)) < own && !self.cuts_corner(cell, step)
                })
                .map_or(Vec2::ZERO, |step| {
                    Vec2::new(step.dx as f32, step.dy as f32).normalize()
                });

            self.directions[idx] = dir;
        }
    }

    /// Lowest-cost corner-safe neighbor strictly cheaper than `cell`; the
    /// first in step order wins ties.
    fn steepest_descent(&self, cell: GridCoord) -> Option<GridCoord> {
        let mut best: Option<(f32, GridCoord)> = None;
        let mut best_cost = self.cost(cell);

        for &step in self.connectivity.steps() {
            let next = cell.offset(step);
            let c = self.cost(next);
            if c < best_cost && !self.cuts_corner(cell, step) {
                best_cost = c;
                best = Some((c, next));
            }
        }
        best.map(|(_, next)| next)
    }
}
