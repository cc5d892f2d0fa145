//! Simulation observer trait for progress reporting and data collection.

use gf_core::{AgentId, Tick};
use gf_mobility::MoveEvent;

use crate::OrderReport;

/// Callbacks invoked by [`Sim::step`][crate::Sim::step] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — arrival counter
///
/// ```rust,ignore
/// struct Arrivals(usize);
///
/// impl SimObserver for Arrivals {
///     fn on_event(&mut self, _tick: Tick, _agent: AgentId, event: MoveEvent) {
///         if matches!(event, MoveEvent::Arrived { .. }) {
///             self.0 += 1;
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called once per order issued since the previous tick, right after
    /// `on_tick_start`.
    fn on_order(&mut self, _tick: Tick, _report: &OrderReport) {}

    /// Called for every agent update that produced something other than
    /// [`MoveEvent::Idle`], in ascending `AgentId` order.
    fn on_event(&mut self, _tick: Tick, _agent: AgentId, _event: MoveEvent) {}

    /// Called at the end of each tick.
    ///
    /// `moving` is the number of agents still moving after this tick.
    fn on_tick_end(&mut self, _tick: Tick, _moving: usize) {}

    /// Called once after the final tick of [`Sim::run`][crate::Sim::run].
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want progress callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
