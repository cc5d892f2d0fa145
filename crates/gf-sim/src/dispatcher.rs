//! Turning one destination into per-agent goals and flow fields.

use std::sync::Arc;

use glam::Vec2;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use gf_core::{AgentId, Connectivity, GfError, GridBounds, GridCoord};
use gf_mobility::{MovementController, ReservationTable};
use gf_spatial::{FlowField, GridGeometry, ObstacleQuery, assign_goals};

use crate::SimResult;

/// Outcome of one [`OrderDispatcher::issue_order`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderReport {
    /// Destination cell after clamping into the bounds.
    pub destination:  GridCoord,
    /// `(agent, goal)` for every agent that received an order, in the order
    /// the agents were given.
    pub assignments:  Vec<(AgentId, GridCoord)>,
    /// Agents left without a goal because the free region around the
    /// destination was too small.
    pub unassigned:   Vec<AgentId>,
    /// Ordered agents with no way to their goal: not on it, and no legal
    /// neighbor of their cell has a finite cost.  They go idle as stuck on
    /// their first update.
    pub unreachable:  Vec<AgentId>,
    /// Assigned agents whose start cell was already held by another agent.
    pub rejected:     Vec<AgentId>,
    pub fields_built: usize,
}

impl OrderReport {
    /// `true` if every requested agent got a goal and accepted it.
    pub fn is_complete(&self) -> bool {
        self.unassigned.is_empty() && self.rejected.is_empty()
    }
}

/// Assigns distinct goals around a destination and hands each agent a
/// shared flow field.
#[derive(Copy, Clone, Debug)]
pub struct OrderDispatcher {
    bounds:       GridBounds,
    connectivity: Connectivity,
}

impl OrderDispatcher {
    pub fn new(bounds: GridBounds, connectivity: Connectivity) -> Self {
        Self { bounds, connectivity }
    }

    #[inline]
    pub fn bounds(&self) -> &GridBounds {
        &self.bounds
    }

    #[inline]
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Order `agents` toward `destination` (world space).
    ///
    /// Every claim in `reservations` is dropped first, so a new batch never
    /// waits behind claims from an old one.  Agents outside the batch (and
    /// batch agents that end up without an order) re-assert their claims
    /// afterwards.  Duplicate ids are ignored after their first occurrence.
    ///
    /// # Errors
    ///
    /// [`SimError::AgentNotFound`][crate::SimError::AgentNotFound] if an id
    /// has no controller.  Nothing is changed in that case.
    pub fn issue_order<G, O>(
        &self,
        destination:  Vec2,
        agents:       &[AgentId],
        controllers:  &mut [MovementController],
        reservations: &mut ReservationTable,
        geometry:     &G,
        obstacles:    &O,
    ) -> SimResult<OrderReport>
    where
        G: GridGeometry + ?Sized,
        O: ObstacleQuery + ?Sized,
    {
        if let Some(&missing) = agents.iter().find(|a| a.index() >= controllers.len()) {
            return Err(GfError::AgentNotFound(missing).into());
        }
        let mut seen = FxHashSet::default();
        let batch: Vec<AgentId> = agents.iter().copied().filter(|a| seen.insert(*a)).collect();

        // ── ① reset claims ────────────────────────────────────────────────
        reservations.clear_all();

        // ── ② destination cell ────────────────────────────────────────────
        let origin = self.bounds.clamp(geometry.world_to_cell(destination));

        // ── ③ distinct goals ──────────────────────────────────────────────
        let goals = assign_goals(origin, &self.bounds, self.connectivity, obstacles, batch.len());
        if goals.len() < batch.len() {
            warn!(
                destination = %origin,
                agents = batch.len(),
                goals = goals.len(),
                "not enough free cells around destination; some agents keep their previous orders"
            );
        }

        let mut report = OrderReport { destination: origin, ..OrderReport::default() };

        // ── ④ one field per distinct goal ─────────────────────────────────
        let mut fields: FxHashMap<GridCoord, Arc<FlowField>> = FxHashMap::default();
        for &goal in &goals {
            fields.entry(goal).or_insert_with(|| {
                let mut field = FlowField::new(self.bounds, self.connectivity);
                field.generate(goal, obstacles);
                Arc::new(field)
            });
        }
        report.fields_built = fields.len();

        // ── ⑤ orders ──────────────────────────────────────────────────────
        let mut ordered = FxHashSet::default();
        for (&agent, &goal) in batch.iter().zip(&goals) {
            let Some(field) = fields.get(&goal) else { continue };
            let controller = &mut controllers[agent.index()];

            match controller.set_order(Arc::clone(field), goal, geometry, reservations) {
                Ok(()) => {
                    let start = controller.current_cell();
                    if !field.can_progress(start) {
                        warn!(%agent, %start, %goal, "goal unreachable from start; agent will stop on its first update");
                        report.unreachable.push(agent);
                    }
                    report.assignments.push((agent, goal));
                    ordered.insert(agent);
                }
                Err(e) => {
                    warn!(%agent, error = %e, "order rejected");
                    report.rejected.push(agent);
                }
            }
        }
        report.unassigned.extend(batch.iter().skip(goals.len()).copied());

        // ── ⑥ everyone else keeps what they had ───────────────────────────
        for controller in controllers.iter_mut() {
            if !ordered.contains(&controller.id()) {
                controller.reassert_claims(reservations);
            }
        }

        debug!(
            destination = %origin,
            assigned = report.assignments.len(),
            unassigned = report.unassigned.len(),
            unreachable = report.unreachable.len(),
            fields = report.fields_built,
            "order issued"
        );
        Ok(report)
    }
}
