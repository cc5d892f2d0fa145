//! Simulation time model and run configuration.
//!
//! # Design
//!
//! Time is represented as a monotonically increasing `Tick` counter.  Every
//! tick advances the world by a fixed `dt`, held in `SimClock`:
//!
//!   elapsed_secs = tick * tick_duration_secs
//!
//! A fixed `dt` keeps movement reproducible: the same inputs always produce
//! the same positions, hops and claims, tick for tick.

use std::fmt;

use crate::{Connectivity, GfError, GfResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the current tick and the fixed step length.
///
/// `SimClock` is cheap to copy and intentionally holds no heap data.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// How many simulated seconds one tick represents (`dt`).
    pub tick_duration_secs: f32,
    /// The current tick — advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(tick_duration_secs: f32) -> Self {
        Self {
            tick_duration_secs,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// `dt` handed to every controller update.
    #[inline]
    pub fn dt(&self) -> f32 {
        self.tick_duration_secs
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.current_tick.0 as f64 * self.tick_duration_secs as f64
    }

    /// How many ticks span `secs` seconds (rounds up).
    #[inline]
    pub fn ticks_for_secs(&self, secs: f32) -> u64 {
        (secs / self.tick_duration_secs).ceil().max(0.0) as u64
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} s)", self.current_tick, self.elapsed_secs())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically built in code or loaded from a JSON file by the application
/// crate (with the `serde` feature) and passed to the simulation builder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Seconds per tick (`dt`).  Default: 1/60.
    pub tick_duration_secs: f32,

    /// Total ticks simulated by `Sim::run`.
    pub total_ticks: u64,

    /// Neighborhood used by the flood fill, hop selection and goal search.
    pub connectivity: Connectivity,

    /// Movement speed given to agents that don't specify one, in world units
    /// per second.
    pub default_speed: f32,

    /// Distance to a cell center below which a hop counts as completed.
    pub arrival_tolerance: f32,

    /// Radius within which nearby agents push each other sideways.
    /// `0.0` disables separation.
    pub separation_radius: f32,

    /// Blend weight of the separation vector against the hop heading.
    /// `0.0` disables separation.
    pub separation_weight: f32,

    /// Master RNG seed for map generation.  The same seed always produces
    /// identical maps.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_duration_secs: 1.0 / 60.0,
            total_ticks:        3_600,
            connectivity:       Connectivity::Eight,
            default_speed:      3.0,
            arrival_tolerance:  0.01,
            separation_radius:  0.0,
            separation_weight:  0.0,
            seed:               42,
        }
    }
}

impl SimConfig {
    /// The tick at which `Sim::run` stops (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// `true` when both separation parameters are positive.
    #[inline]
    pub fn separation_enabled(&self) -> bool {
        self.separation_radius > 0.0 && self.separation_weight > 0.0
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_duration_secs)
    }

    /// Reject values that would stall or destabilise movement.
    pub fn validate(&self) -> GfResult<()> {
        if !(self.tick_duration_secs > 0.0) {
            return Err(GfError::Config(format!(
                "tick_duration_secs must be positive, got {}",
                self.tick_duration_secs
            )));
        }
        if !(self.default_speed > 0.0) {
            return Err(GfError::Config(format!(
                "default_speed must be positive, got {}",
                self.default_speed
            )));
        }
        if !(self.arrival_tolerance > 0.0) {
            return Err(GfError::Config(format!(
                "arrival_tolerance must be positive, got {}",
                self.arrival_tolerance
            )));
        }
        if self.separation_radius < 0.0 || self.separation_weight < 0.0 {
            return Err(GfError::Config(
                "separation_radius and separation_weight must not be negative".into(),
            ));
        }
        Ok(())
    }
}
