//! `gf-mobility` — cell reservations, hop selection, and per-agent movement.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                       |
//! |-----------------|----------------------------------------------------------------|
//! | [`reservation`] | `ReservationTable` — exclusive cell claims shared by all agents |
//! | [`policy`]      | `HopPolicy` trait, `CostAscending`, `DirectionAlignment`       |
//! | [`controller`]  | `MovementController` — Idle/Moving state machine per agent     |
//! | [`separation`]  | inverse-distance repulsion for smoother sub-cell motion        |
//! | [`error`]       | `MobilityError`, `MobilityResult<T>`                           |
//!
//! # Movement model (discrete hops, continuous position)
//!
//! Agents move cell to cell.  Before leaving a cell an agent claims the
//! neighbor it is heading for in the [`ReservationTable`]; it releases the
//! cell it came from once it reaches the neighbor's center.  Between the two
//! the agent's world position glides at its speed, so rendering can draw it
//! anywhere along the hop while the cell logic stays exact.
//!
//! Controllers never own their collaborators: geometry, obstacles, the hop
//! policy and the reservation table are lent to each
//! [`MovementController::update`] through a [`MoveContext`].

pub mod controller;
pub mod error;
pub mod policy;
pub mod reservation;
pub mod separation;


pub use controller::{MoveContext, MoveEvent, MoveState, MovementController};
pub use error::{MobilityError, MobilityResult};
pub use policy::{CostAscending, DirectionAlignment, HopCandidate, HopPolicy};
pub use reservation::ReservationTable;
