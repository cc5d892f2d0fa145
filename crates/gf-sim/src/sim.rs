//! The `Sim` struct and its tick loop.

use std::sync::Arc;

use glam::Vec2;
use rustc_hash::FxHashMap;
use tracing::debug;

use gf_core::{AgentId, GfError, GridBounds, GridCoord, SimClock, SimConfig, Tick};
use gf_mobility::{
    CostAscending, HopPolicy, MoveContext, MoveEvent, MovementController, ReservationTable,
    separation,
};
use gf_spatial::{FlowField, GridGeometry, ObstacleQuery};

use crate::{OrderDispatcher, OrderReport, SimError, SimObserver, SimResult};

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `Sim<G, O, P>` holds all simulation state and drives the fixed tick loop:
///
/// 1. **Orders**: reports of orders issued since the last tick are passed to
///    the observer.  The orders themselves took effect inside
///    [`issue_order`][Self::issue_order].
/// 2. **Separation** (only when enabled): agent positions are bucketed once
///    and every agent gets a repulsion vector from its neighbors.
/// 3. **Update**: every controller advances by `dt`, in ascending `AgentId`
///    order.  Claims are therefore contested in a fixed order and two
///    identical runs produce identical results.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<G, O, P = CostAscending> {
    /// Global configuration (tick duration, speeds, tolerances, …).
    pub config: SimConfig,

    /// Simulation clock — tracks the current tick and `dt`.
    pub clock: SimClock,

    /// World ↔ cell mapping.
    pub geometry: G,

    /// Static obstacles.
    pub obstacles: O,

    /// Hop selection used by every agent.
    pub policy: P,

    /// The only shared mutable state between agents.
    pub reservations: ReservationTable,

    /// Per-agent controllers, indexed by `AgentId`.
    pub agents: Vec<MovementController>,

    pub dispatcher: OrderDispatcher,

    /// Reports of orders issued since the last tick started.
    pending_reports: Vec<OrderReport>,
}

impl<G, O, P> Sim<G, O, P>
where
    G: GridGeometry,
    O: ObstacleQuery,
    P: HopPolicy,
{
    pub(crate) fn from_parts(
        config:     SimConfig,
        geometry:   G,
        obstacles:  O,
        policy:     P,
        dispatcher: OrderDispatcher,
        agents:     Vec<MovementController>,
    ) -> Self {
        Self {
            clock: config.make_clock(),
            config,
            geometry,
            obstacles,
            policy,
            reservations: ReservationTable::new(),
            agents,
            dispatcher,
            pending_reports: Vec::new(),
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn now(&self) -> Tick {
        self.clock.current_tick
    }

    #[inline]
    pub fn bounds(&self) -> &GridBounds {
        self.dispatcher.bounds()
    }

    #[inline]
    pub fn agent(&self, id: AgentId) -> Option<&MovementController> {
        self.agents.get(id.index())
    }

    /// Number of agents currently moving.
    pub fn moving_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_moving()).count()
    }

    #[inline]
    pub fn all_idle(&self) -> bool {
        self.agents.iter().all(|a| !a.is_moving())
    }

    /// Every agent id, ascending.
    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(MovementController::id).collect()
    }

    // ── Orders ────────────────────────────────────────────────────────────

    /// Send `agents` toward `destination` (world space).  See
    /// [`OrderDispatcher::issue_order`].
    pub fn issue_order(&mut self, destination: Vec2, agents: &[AgentId]) -> SimResult<OrderReport> {
        let report = self.dispatcher.issue_order(
            destination,
            agents,
            &mut self.agents,
            &mut self.reservations,
            &self.geometry,
            &self.obstacles,
        )?;
        self.pending_reports.push(report.clone());
        Ok(report)
    }

    /// Send `agents` toward the center of `cell`.
    pub fn issue_order_to_cell(&mut self, cell: GridCoord, agents: &[AgentId]) -> SimResult<OrderReport> {
        let destination = self.geometry.cell_center(cell);
        self.issue_order(destination, agents)
    }

    /// Order one agent straight to `goal`, bypassing goal assignment and
    /// leaving every other claim in place.
    ///
    /// # Errors
    ///
    /// - [`SimError::AgentNotFound`] for an unknown id.
    /// - [`SimError::Spatial`] if `goal` lies outside the bounds.
    /// - [`SimError::Mobility`] if another agent holds the agent's cell.
    pub fn order_agent(&mut self, agent: AgentId, goal: GridCoord) -> SimResult<()> {
        let bounds = *self.dispatcher.bounds();
        if !bounds.contains(goal) {
            return Err(GfError::OutOfBounds(goal).into());
        }
        let controller = self
            .agents
            .get_mut(agent.index())
            .ok_or(SimError::AgentNotFound(agent))?;

        let mut field = FlowField::new(bounds, self.dispatcher.connectivity());
        field.generate(goal, &self.obstacles);
        controller.set_order(Arc::new(field), goal, &self.geometry, &mut self.reservations)?;
        Ok(())
    }

    /// Stop `agent` where it stands.
    pub fn halt(&mut self, agent: AgentId) -> SimResult<()> {
        let controller = self
            .agents
            .get_mut(agent.index())
            .ok_or(SimError::AgentNotFound(agent))?;
        controller.halt(&mut self.reservations);
        Ok(())
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`.
    ///
    /// Calls observer hooks at every tick boundary.  Use
    /// [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<S: SimObserver>(&mut self, observer: &mut S) {
        while self.clock.current_tick < self.config.end_tick() {
            self.step(observer);
        }
        observer.on_sim_end(self.clock.current_tick);
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<S: SimObserver>(&mut self, n: u64, observer: &mut S) {
        for _ in 0..n {
            self.step(observer);
        }
    }

    /// Step until every agent is idle or `max_ticks` have run.  Returns
    /// `true` if the agents settled.
    pub fn run_until_idle<S: SimObserver>(&mut self, max_ticks: u64, observer: &mut S) -> bool {
        for _ in 0..max_ticks {
            if self.all_idle() {
                debug!(tick = %self.now(), "all agents idle");
                return true;
            }
            self.step(observer);
        }
        self.all_idle()
    }

    /// Advance one tick.  Returns the number of agents still moving.
    pub fn step<S: SimObserver>(&mut self, observer: &mut S) -> usize {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);
        for report in self.pending_reports.drain(..) {
            observer.on_order(now, &report);
        }

        let steer = self.separation_vectors();
        let dt = self.clock.dt();

        // Explicit field borrows so the borrow checker sees disjoint access.
        let geometry     = &self.geometry;
        let obstacles    = &self.obstacles;
        let policy       = &self.policy;
        let reservations = &mut self.reservations;
        let tolerance    = self.config.arrival_tolerance;

        let mut moving = 0;
        for (agent, steer) in self.agents.iter_mut().zip(steer) {
            let mut ctx = MoveContext {
                geometry,
                obstacles,
                policy,
                reservations: &mut *reservations,
                arrival_tolerance: tolerance,
                steer,
            };
            let event = agent.update(dt, &mut ctx);
            if event != MoveEvent::Idle {
                observer.on_event(now, agent.id(), event);
            }
            if agent.is_moving() {
                moving += 1;
            }
        }

        observer.on_tick_end(now, moving);
        self.clock.advance();
        moving
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Weighted repulsion per agent, zero for idle agents or when separation
    /// is disabled.
    fn separation_vectors(&self) -> Vec<Vec2> {
        let mut steer = vec![Vec2::ZERO; self.agents.len()];
        if !self.config.separation_enabled() {
            return steer;
        }
        let radius = self.config.separation_radius;
        let index = build_neighbor_index(&self.agents, radius);

        for (agent, out) in self.agents.iter().zip(steer.iter_mut()) {
            if !agent.is_moving() {
                continue;
            }
            let neighbors = neighbors_of(agent, &index, &self.agents, radius);
            *out = separation::repulsion(agent.position(), neighbors, radius) * self.config.separation_weight;
        }
        steer
    }
}

// ── Neighbor index ────────────────────────────────────────────────────────────

type Bucket = (i32, i32);

#[inline]
fn bucket_of(position: Vec2, size: f32) -> Bucket {
    ((position.x / size).floor() as i32, (position.y / size).floor() as i32)
}

/// Bucket every agent by its position on a square lattice of side `radius`,
/// so each agent only has to look at the 3×3 buckets around its own.
fn build_neighbor_index(agents: &[MovementController], radius: f32) -> FxHashMap<Bucket, Vec<AgentId>> {
    let mut index: FxHashMap<Bucket, Vec<AgentId>> = FxHashMap::default();
    for agent in agents {
        index
            .entry(bucket_of(agent.position(), radius))
            .or_default()
            .push(agent.id());
    }
    index
}

/// Positions of every other agent in the 3×3 buckets around `agent`.
fn neighbors_of<'a>(
    agent:  &'a MovementController,
    index:  &'a FxHashMap<Bucket, Vec<AgentId>>,
    agents: &'a [MovementController],
    radius: f32,
) -> impl Iterator<Item = Vec2> + 'a {
    let (bx, by) = bucket_of(agent.position(), radius);
    (-1..=1)
        .flat_map(move |dy| (-1..=1).map(move |dx| (bx + dx, by + dy)))
        .filter_map(move |b| index.get(&b))
        .flatten()
        .filter(move |&&other| other != agent.id())
        .map(move |&other| agents[other.index()].position())
}
