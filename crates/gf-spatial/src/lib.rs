//! `gf-spatial` — grid geometry, obstacles, flow fields, and goal search.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`grid`]        | `GridGeometry` trait, `UniformGrid`                        |
//! | [`obstacles`]   | `ObstacleQuery` trait, `ObstacleMap`                       |
//! | [`moves`]       | single-step legality (bounds, blocking, corner-cutting)    |
//! | [`flow_field`]  | `FlowField` — cost + direction field toward one goal       |
//! | [`goals`]       | `assign_goals` — BFS for distinct free goal cells          |
//! | [`error`]       | `SpatialError`, `SpatialResult<T>`                         |
//!
//! # Pluggability
//!
//! The movement core consumes the world only through [`GridGeometry`] and
//! [`ObstacleQuery`], so applications can back them with a tilemap, a
//! physics broadphase, or anything else.  `UniformGrid` and `ObstacleMap`
//! are complete reference implementations.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public value types.     |

pub mod error;
pub mod flow_field;
pub mod goals;
pub mod grid;
pub mod moves;
pub mod obstacles;


pub use error::{SpatialError, SpatialResult};
pub use flow_field::FlowField;
pub use goals::assign_goals;
pub use grid::{GridGeometry, UniformGrid};
pub use obstacles::{ObstacleMap, ObstacleQuery};

/// Re-exported so downstream crates name the same vector type.
pub use glam::Vec2;
