//! `gf-core` — foundational types for the `gridflow` movement core.
//!
//! This crate is a dependency of every other `gf-*` crate.  It intentionally
//! has no `gf-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`                                             |
//! | [`geo`]         | `GridCoord`, `GridBounds`, `Connectivity`, `Step`     |
//! | [`time`]        | `Tick`, `SimClock`, `SimConfig`                       |
//! | [`rng`]         | `SimRng` (seeded map generation)                      |
//! | [`error`]       | `GfError`, `GfResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public value types.  |
//!           | Required to load `SimConfig` from a file.                  |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{GfError, GfResult};
pub use geo::{BoundsSpec, Connectivity, GridBounds, GridCoord, Step};
pub use ids::AgentId;
pub use rng::SimRng;
pub use time::{SimClock, SimConfig, Tick};
