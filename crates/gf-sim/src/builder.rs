//! Fluent builder for constructing a [`Sim`].

use glam::Vec2;
use tracing::{debug, warn};

use gf_core::{AgentId, GridBounds, SimConfig};
use gf_mobility::{CostAscending, HopPolicy, MovementController};
use gf_spatial::{GridGeometry, ObstacleQuery};

use crate::{OrderDispatcher, Sim, SimError, SimResult};

/// Fluent builder for [`Sim<G, O, P>`].
///
/// # Required inputs
///
/// - [`SimConfig`] — tick duration, connectivity, speeds, …
/// - `G: GridGeometry` — world ↔ cell mapping (e.g. [`gf_spatial::UniformGrid`])
/// - `O: ObstacleQuery` — static obstacles (e.g. [`gf_spatial::ObstacleMap`])
/// - [`GridBounds`] — the playable region
///
/// # Optional inputs (have defaults)
///
/// | Method                      | Default                       |
/// |-----------------------------|-------------------------------|
/// | `.policy(p)`                | [`CostAscending`]             |
/// | `.speed(s)`                 | `config.default_speed`        |
/// | `.agent(pos)` / `.agents()` | no agents                     |
///
/// # Example
///
/// ```rust,ignore
/// let (obstacles, bounds) = ObstacleMap::from_ascii(MAP)?;
/// let mut sim = SimBuilder::new(config, UniformGrid::unit(), obstacles, bounds)
///     .agents(spawns)
///     .build()?;
/// sim.issue_order(Vec2::new(10.5, 3.5), &sim.agent_ids())?;
/// sim.run_until_idle(10_000, &mut NoopObserver);
/// ```
pub struct SimBuilder<G, O, P = CostAscending> {
    config:    SimConfig,
    geometry:  G,
    obstacles: O,
    bounds:    GridBounds,
    policy:    P,
    speed:     Option<f32>,
    /// Spawn position plus an optional per-agent speed override.
    spawns:    Vec<(Vec2, Option<f32>)>,
}

impl<G, O> SimBuilder<G, O, CostAscending>
where
    G: GridGeometry,
    O: ObstacleQuery,
{
    /// Create a builder with all required inputs.
    pub fn new(config: SimConfig, geometry: G, obstacles: O, bounds: GridBounds) -> Self {
        Self {
            config,
            geometry,
            obstacles,
            bounds,
            policy: CostAscending,
            speed:  None,
            spawns: Vec::new(),
        }
    }
}

impl<G, O, P> SimBuilder<G, O, P>
where
    G: GridGeometry,
    O: ObstacleQuery,
    P: HopPolicy,
{
    /// Replace the hop-selection policy.
    pub fn policy<Q: HopPolicy>(self, policy: Q) -> SimBuilder<G, O, Q> {
        SimBuilder {
            config:    self.config,
            geometry:  self.geometry,
            obstacles: self.obstacles,
            bounds:    self.bounds,
            policy,
            speed:     self.speed,
            spawns:    self.spawns,
        }
    }

    /// Speed for agents added without their own.
    pub fn speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Add one agent at `position`.  Agents get ids in the order added.
    pub fn agent(mut self, position: Vec2) -> Self {
        self.spawns.push((position, None));
        self
    }

    /// Add one agent with its own speed.
    pub fn agent_with_speed(mut self, position: Vec2, speed: f32) -> Self {
        self.spawns.push((position, Some(speed)));
        self
    }

    pub fn agents<I: IntoIterator<Item = Vec2>>(mut self, positions: I) -> Self {
        self.spawns.extend(positions.into_iter().map(|p| (p, None)));
        self
    }

    /// Validate inputs, place the agents, and return a ready-to-run [`Sim`].
    /// Every agent starts idle and holds no claims.
    ///
    /// # Errors
    ///
    /// - [`SimError::Config`] for an invalid [`SimConfig`] or speed.
    /// - [`SimError::AgentOutOfBounds`] if a spawn lies outside the bounds.
    pub fn build(self) -> SimResult<Sim<G, O, P>> {
        self.config.validate()?;
        let default_speed = self.speed.unwrap_or(self.config.default_speed);

        // ── Validate and place agents ─────────────────────────────────────
        let mut agents = Vec::with_capacity(self.spawns.len());
        for (i, &(position, speed)) in self.spawns.iter().enumerate() {
            let id = AgentId::try_from(i)
                .map_err(|_| SimError::Config(format!("too many agents: {}", self.spawns.len())))?;
            let speed = speed.unwrap_or(default_speed);
            if !(speed > 0.0 && speed.is_finite()) {
                return Err(SimError::Config(format!("{id} speed must be positive, got {speed}")));
            }

            let cell = self.geometry.world_to_cell(position);
            if !self.bounds.contains(cell) {
                return Err(SimError::AgentOutOfBounds { agent: id, cell });
            }
            if self.obstacles.is_blocked(cell) {
                warn!(agent = %id, %cell, "agent spawned on a blocked cell");
            }
            agents.push(MovementController::new(id, position, speed, &self.geometry));
        }

        let dispatcher = OrderDispatcher::new(self.bounds, self.config.connectivity);
        debug!(
            agents = agents.len(),
            bounds = %self.bounds,
            connectivity = ?self.config.connectivity,
            "simulation built"
        );

        Ok(Sim::from_parts(
            self.config,
            self.geometry,
            self.obstacles,
            self.policy,
            dispatcher,
            agents,
        ))
    }
}
