//! Spatial-subsystem error type.

use thiserror::Error;

use gf_core::GfError;

/// Errors produced by `gf-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error(transparent)]
    Core(#[from] GfError),

    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),

    #[error("map parse error: {0}")]
    Parse(String),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
