//! Per-agent movement state machine.
//!
//! # Tick procedure
//!
//! An agent in [`MoveState::Moving`] does the following on each
//! [`MovementController::update`]:
//!
//! 1. **Goal check:** standing on the goal cell ⇒ snap to its center,
//!    release the claim, go idle ([`MoveEvent::Arrived`]).
//! 2. **Hop completion:** within `arrival_tolerance` of the next cell's
//!    center ⇒ release the current cell, the next cell becomes current (and
//!    the goal check runs again).
//! 3. **Hop selection:** no hop in flight ⇒ gather legal, unclaimed,
//!    reachable neighbors, let the [`HopPolicy`] pick one and claim it.
//!    No candidate ⇒ release and go idle ([`MoveEvent::Stuck`]).
//! 4. **Motion:** move toward the next cell's center by `speed × dt`,
//!    never overshooting.
//!
//! While moving an agent holds a claim on its current cell and, during a
//! hop, on the next cell too.  Idle agents hold nothing.

use std::sync::Arc;

use glam::Vec2;
use tracing::{debug, trace, warn};

use gf_core::{AgentId, GridCoord};
use gf_spatial::{FlowField, GridGeometry, ObstacleQuery, moves};

use crate::policy::{HopCandidate, HopPolicy};
use crate::separation;
use crate::{MobilityError, MobilityResult, ReservationTable};

// ── State & events ────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MoveState {
    #[default]
    Idle,
    Moving,
}

/// What happened to one agent during one `update`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveEvent {
    /// The agent was idle and stayed idle.
    Idle,
    /// The agent is travelling; no claim changed.
    Moving,
    /// A new hop from `from` to `to` was claimed.
    Hopped { from: GridCoord, to: GridCoord },
    /// The agent reached its goal and went idle.
    Arrived { cell: GridCoord },
    /// No legal hop existed from `cell`; the agent went idle.
    Stuck { cell: GridCoord },
}

/// Collaborators lent to a controller for one `update`.
pub struct MoveContext<'a, G: ?Sized, O: ?Sized, P: ?Sized> {
    pub geometry:          &'a G,
    pub obstacles:         &'a O,
    pub policy:            &'a P,
    pub reservations:      &'a mut ReservationTable,
    /// Hop-completion distance to a cell center.
    pub arrival_tolerance: f32,
    /// Weighted separation vector for this agent; zero when disabled.
    pub steer:             Vec2,
}

// ── MovementController ────────────────────────────────────────────────────────

/// One agent's position, claims and order.
#[derive(Clone, Debug)]
pub struct MovementController {
    id:       AgentId,
    state:    MoveState,
    position: Vec2,
    speed:    f32,
    current:  GridCoord,
    next:     GridCoord,
    goal:     GridCoord,
    field:    Option<Arc<FlowField>>,
}

impl MovementController {
    /// An idle agent at `position`.
    pub fn new<G>(id: AgentId, position: Vec2, speed: f32, geometry: &G) -> Self
    where
        G: GridGeometry + ?Sized,
    {
        let cell = geometry.world_to_cell(position);
        Self {
            id,
            state:   MoveState::Idle,
            position,
            speed,
            current: cell,
            next:    cell,
            goal:    cell,
            field:   None,
        }
    }

    #[inline]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> MoveState {
        self.state
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.state == MoveState::Moving
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    pub fn current_cell(&self) -> GridCoord {
        self.current
    }

    #[inline]
    pub fn next_cell(&self) -> GridCoord {
        self.next
    }

    #[inline]
    pub fn goal_cell(&self) -> GridCoord {
        self.goal
    }

    /// Field of the most recent order, kept after arrival for inspection.
    #[inline]
    pub fn field(&self) -> Option<&Arc<FlowField>> {
        self.field.as_ref()
    }

    /// Start following `field` toward `goal`, cancelling any previous order.
    ///
    /// # Errors
    ///
    /// [`MobilityError::CellTaken`] if another agent holds the cell under
    /// this agent's position.  The agent is left idle with no claims.
    pub fn set_order<G>(
        &mut self,
        field:        Arc<FlowField>,
        goal:         GridCoord,
        geometry:     &G,
        reservations: &mut ReservationTable,
    ) -> MobilityResult<()>
    where
        G: GridGeometry + ?Sized,
    {
        self.halt(reservations);

        let cell = geometry.world_to_cell(self.position);
        self.current = cell;
        self.next = cell;
        if !reservations.try_claim(cell, self.id) {
            let holder = reservations.holder(cell).unwrap_or(AgentId::INVALID);
            return Err(MobilityError::CellTaken { cell, agent: self.id, holder });
        }

        self.goal = goal;
        self.field = Some(field);
        self.state = MoveState::Moving;
        trace!(agent = %self.id, %cell, %goal, "order accepted");
        Ok(())
    }

    /// Advance one tick of `dt` seconds.
    pub fn update<G, O, P>(&mut self, dt: f32, ctx: &mut MoveContext<'_, G, O, P>) -> MoveEvent
    where
        G: GridGeometry + ?Sized,
        O: ObstacleQuery + ?Sized,
        P: HopPolicy + ?Sized,
    {
        if self.state == MoveState::Idle {
            return MoveEvent::Idle;
        }
        let Some(field) = self.field.clone() else {
            warn!(error = %MobilityError::NoField(self.id), "halting");
            self.halt(ctx.reservations);
            return MoveEvent::Idle;
        };

        // ① goal check
        if self.current == self.goal {
            return self.arrive(ctx.geometry, ctx.reservations);
        }

        // ② hop completion
        if self.next != self.current {
            let center = ctx.geometry.cell_center(self.next);
            if self.position.distance(center) <= ctx.arrival_tolerance {
                ctx.reservations.release_owned(self.current, self.id);
                self.current = self.next;
                if self.current == self.goal {
                    return self.arrive(ctx.geometry, ctx.reservations);
                }
            }
        }

        // ③ hop selection
        let mut event = MoveEvent::Moving;
        if self.next == self.current {
            let candidates = self.hop_candidates(&field, ctx.obstacles, ctx.reservations);
            let Some(hop) = ctx.policy.select(&field, self.current, &candidates) else {
                let cell = self.current;
                self.halt(ctx.reservations);
                debug!(agent = %self.id, %cell, goal = %self.goal, "stuck");
                return MoveEvent::Stuck { cell };
            };
            if ctx.reservations.try_claim(hop.cell, self.id) {
                trace!(agent = %self.id, from = %self.current, to = %hop.cell, "hop claimed");
                self.next = hop.cell;
                event = MoveEvent::Hopped { from: self.current, to: hop.cell };
            }
        }

        // ④ motion
        let target = ctx.geometry.cell_center(self.next);
        self.advance_toward(target, self.speed * dt, ctx.steer);
        event
    }

    /// Cancel the current order and release this agent's claims.
    pub fn halt(&mut self, reservations: &mut ReservationTable) {
        reservations.release_owned(self.current, self.id);
        reservations.release_owned(self.next, self.id);
        self.next = self.current;
        self.state = MoveState::Idle;
    }

    /// Re-claim the cells a moving agent occupies after the table was
    /// cleared.  An agent that cannot get its cells back is halted.
    ///
    /// Returns `false` if the agent was halted.
    pub fn reassert_claims(&mut self, reservations: &mut ReservationTable) -> bool {
        if self.state == MoveState::Idle {
            return true;
        }
        if reservations.try_claim(self.current, self.id) && reservations.try_claim(self.next, self.id) {
            return true;
        }
        warn!(agent = %self.id, cell = %self.current, "lost claim after reservation reset; halting");
        self.halt(reservations);
        false
    }

    /// Move to `position` as an idle agent, dropping any order.
    pub fn teleport<G>(&mut self, position: Vec2, geometry: &G, reservations: &mut ReservationTable)
    where
        G: GridGeometry + ?Sized,
    {
        self.halt(reservations);
        self.position = position;
        self.current = geometry.world_to_cell(position);
        self.next = self.current;
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn arrive<G>(&mut self, geometry: &G, reservations: &mut ReservationTable) -> MoveEvent
    where
        G: GridGeometry + ?Sized,
    {
        let cell = self.current;
        self.position = geometry.cell_center(cell);
        self.halt(reservations);
        debug!(agent = %self.id, %cell, "arrived");
        MoveEvent::Arrived { cell }
    }

    fn hop_candidates<O>(
        &self,
        field:        &FlowField,
        obstacles:    &O,
        reservations: &ReservationTable,
    ) -> Vec<HopCandidate>
    where
        O: ObstacleQuery + ?Sized,
    {
        field
            .connectivity()
            .steps()
            .iter()
            .filter(|&&step| moves::can_step(field.bounds(), obstacles, self.current, step))
            .filter_map(|&step| {
                let cell = self.current.offset(step);
                let cost = field.cost(cell);
                (cost.is_finite() && !reservations.is_claimed(cell))
                    .then_some(HopCandidate { cell, step, cost })
            })
            .collect()
    }

    /// Step toward `target` by at most `max_step`.  Separation only bends the
    /// path while the target is more than two steps away, so every hop still
    /// lands exactly on its center.
    fn advance_toward(&mut self, target: Vec2, max_step: f32, steer: Vec2) {
        let offset = target - self.position;
        let dist = offset.length();
        if dist <= max_step {
            self.position = target;
            return;
        }
        let heading = offset / dist;
        let mut delta = heading * max_step;
        if steer != Vec2::ZERO && dist > 2.0 * max_step {
            delta += separation::lateral(steer, heading) * max_step;
        }
        self.position += delta;
    }
}
