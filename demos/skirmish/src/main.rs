//! skirmish — a squad crossing a walled field in two orders.
//!
//! Twelve agents spawn on the west edge of a small map, are ordered to a
//! rally point in the east, and once they settle half of them are sent on
//! to an outpost in the north.  Every hop is contested through the shared
//! reservation table, so agents queue around each other instead of
//! stacking on one cell.
//!
//! ```text
//! cargo run -p skirmish                 # built-in config
//! cargo run -p skirmish -- config.json  # SimConfig fields as JSON; missing fields use defaults
//! RUST_LOG=gf_sim=debug cargo run -p skirmish
//! ```

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gf_core::{AgentId, Connectivity, GridBounds, GridCoord, SimConfig, SimRng, Tick};
use gf_mobility::MoveEvent;
use gf_sim::{OrderReport, Sim, SimBuilder, SimObserver};
use gf_spatial::{GridGeometry, ObstacleMap, ObstacleQuery, UniformGrid};

// ── Constants ─────────────────────────────────────────────────────────────────

const AGENT_COUNT:     usize = 12;
const RUBBLE_DENSITY:  f64   = 0.06;
const MAX_ORDER_SECS:  f32   = 120.0; // simulated time each order may take

/// `#` is wall, `~` is water.  Agents spawn along the west edge.
const MAP: &str = "
    ....................
    ....................
    ......#.......~~~...
    ......#.......~~~...
    ......#.............
    ......#.............
    ..............####..
    ..............#.....
    ......#.......#.....
    ......#.............
    ......#.............
    ....................
";

const RALLY:   GridCoord = GridCoord::new(17, 2);
const OUTPOST: GridCoord = GridCoord::new(12, 10);

// ── Observer ──────────────────────────────────────────────────────────────────

/// Logs orders and exceptional events, counts the rest.
#[derive(Default)]
struct BattleLog {
    hops:        usize,
    arrivals:    usize,
    stuck:       Vec<AgentId>,
    peak_moving: (Tick, usize),
}

impl SimObserver for BattleLog {
    fn on_order(&mut self, tick: Tick, report: &OrderReport) {
        info!(
            %tick,
            destination = %report.destination,
            assigned = report.assignments.len(),
            unassigned = report.unassigned.len(),
            unreachable = report.unreachable.len(),
            fields = report.fields_built,
            "order received"
        );
    }

    fn on_event(&mut self, tick: Tick, agent: AgentId, event: MoveEvent) {
        match event {
            MoveEvent::Hopped { .. } => self.hops += 1,
            MoveEvent::Arrived { .. } => self.arrivals += 1,
            MoveEvent::Stuck { cell } => {
                warn!(%tick, %agent, %cell, "agent stuck");
                self.stuck.push(agent);
            }
            MoveEvent::Idle | MoveEvent::Moving => {}
        }
    }

    fn on_tick_end(&mut self, tick: Tick, moving: usize) {
        if moving > self.peak_moving.1 {
            self.peak_moving = (tick, moving);
        }
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn load_config() -> Result<SimConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(SimConfig {
            tick_duration_secs: 1.0 / 30.0,
            connectivity:       Connectivity::Eight,
            default_speed:      4.0,
            separation_radius:  0.9,
            separation_weight:  0.4,
            ..SimConfig::default()
        });
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config: SimConfig = serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    info!(%path, "loaded config");
    Ok(config)
}

/// Parse the map, treating `~` as water, then sprinkle rubble away from the
/// spawn zone and both rally points.
fn build_map(rng: &mut SimRng) -> Result<(ObstacleMap, GridBounds)> {
    let water = MAP.replace('~', "#");
    let (mut obstacles, bounds) = ObstacleMap::from_ascii(&water)?;

    let mut keep_clear: Vec<GridCoord> = bounds.cells().filter(|c| c.x < 3).collect();
    for centre in [RALLY, OUTPOST] {
        keep_clear.extend(bounds.cells().filter(|c| c.chebyshev(centre) <= 2));
    }
    obstacles.scatter(&bounds, RUBBLE_DENSITY, rng, &keep_clear);
    Ok((obstacles, bounds))
}

/// `AGENT_COUNT` distinct free cells in the three westmost columns.
fn spawn_cells(bounds: &GridBounds, obstacles: &ObstacleMap, rng: &mut SimRng) -> Vec<GridCoord> {
    let mut cells: Vec<GridCoord> = bounds
        .cells()
        .filter(|c| c.x < 3 && !obstacles.is_blocked(*c))
        .collect();
    rng.shuffle(&mut cells);
    cells.truncate(AGENT_COUNT);
    cells.sort();
    cells
}

fn render<G: GridGeometry>(sim: &Sim<G, ObstacleMap>) -> String {
    let bounds = *sim.bounds();
    let mut out = String::new();
    for y in (0..bounds.height()).rev() {
        for x in 0..bounds.width() {
            let cell = GridCoord::new(x, y);
            let agent = sim.agents.iter().position(|a| a.current_cell() == cell);
            let ch = match agent {
                Some(i) => char::from_digit((i % 36) as u32, 36).unwrap_or('@'),
                None if sim.obstacles.is_blocked(cell) => '#',
                None if cell == RALLY || cell == OUTPOST => '+',
                None => '.',
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("skirmish=info,gf_sim=info,gf_mobility=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let config = load_config()?;
    let mut rng = SimRng::new(config.seed);
    let (obstacles, bounds) = build_map(&mut rng)?;
    let spawns = spawn_cells(&bounds, &obstacles, &mut rng);
    info!(agents = spawns.len(), %bounds, blocked = obstacles.len(), "map ready");

    let grid = UniformGrid::unit();
    let mut sim = SimBuilder::new(config, grid, obstacles, bounds)
        .agents(spawns.iter().map(|&c| grid.cell_center(c)))
        .build()?;

    println!("{}", render(&sim));

    let mut log = BattleLog::default();
    let max_ticks = sim.clock.ticks_for_secs(MAX_ORDER_SECS);
    let t0 = Instant::now();

    // 1. Everyone to the rally point.
    sim.issue_order_to_cell(RALLY, &sim.agent_ids())?;
    let settled = sim.run_until_idle(max_ticks, &mut log);
    info!(tick = %sim.now(), settled, "first order finished");

    // 2. Even-numbered agents on to the outpost.
    let detachment: Vec<AgentId> = sim.agent_ids().into_iter().filter(|a| a.0 % 2 == 0).collect();
    sim.issue_order_to_cell(OUTPOST, &detachment)?;
    let settled = sim.run_until_idle(max_ticks, &mut log);
    info!(tick = %sim.now(), settled, "second order finished");

    let elapsed = t0.elapsed();
    println!("{}", render(&sim));
    println!(
        "{} ticks ({:.1} s simulated) in {:.3} s",
        sim.now().0,
        sim.clock.elapsed_secs(),
        elapsed.as_secs_f64()
    );
    println!(
        "hops: {}  arrivals: {}  stuck: {}  peak moving: {} at {}",
        log.hops,
        log.arrivals,
        log.stuck.len(),
        log.peak_moving.1,
        log.peak_moving.0
    );
    Ok(())
}
