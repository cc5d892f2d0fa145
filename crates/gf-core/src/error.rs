//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `GfError` as one variant
//! via `#[from]`, so bounds and configuration failures surface unchanged.

use thiserror::Error;

use crate::{AgentId, GridCoord};

/// The error type for `gf-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum GfError {
    #[error("grid bounds must be positive, got {width}x{height}")]
    InvalidBounds { width: i32, height: i32 },

    #[error("cell {0} lies outside the grid bounds")]
    OutOfBounds(GridCoord),

    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for all `gf-*` crates.
pub type GfResult<T> = Result<T, GfError>;
