//! `gf-sim` — order dispatch and the fixed-tick loop for the gridflow core.
//!
//! # Tick loop
//!
//! ```text
//! issue_order(dest, agents)          (any time between ticks)
//!   ① clear every claim
//!   ② dest → cell, clamped into bounds
//!   ③ BFS for one distinct free goal per agent
//!   ④ one FlowField per distinct goal (shared via Arc)
//!   ⑤ set_order on each assigned agent; everyone else re-asserts claims
//!
//! for tick in 0..config.total_ticks:
//!   ① report pending orders to the observer
//!   ② separation vectors (when enabled)
//!   ③ update every controller by dt, ascending AgentId
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use gf_core::SimConfig;
//! use gf_sim::{NoopObserver, SimBuilder};
//! use gf_spatial::{ObstacleMap, UniformGrid, Vec2};
//!
//! let (obstacles, bounds) = ObstacleMap::from_ascii(MAP)?;
//! let mut sim = SimBuilder::new(SimConfig::default(), UniformGrid::unit(), obstacles, bounds)
//!     .agents([Vec2::new(0.5, 0.5), Vec2::new(1.5, 0.5)])
//!     .build()?;
//! let everyone = sim.agent_ids();
//! sim.issue_order(Vec2::new(8.5, 8.5), &everyone)?;
//! sim.run_until_idle(5_000, &mut NoopObserver);
//! ```

pub mod builder;
pub mod dispatcher;
pub mod error;
pub mod observer;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use dispatcher::{OrderDispatcher, OrderReport};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::Sim;
