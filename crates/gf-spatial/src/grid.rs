//! World ↔ cell coordinate mapping.

use glam::Vec2;

use gf_core::GridCoord;

use crate::{SpatialError, SpatialResult};

/// Maps continuous world positions to grid cells and back.
///
/// Implementations must be consistent: `world_to_cell(cell_center(c)) == c`
/// for every cell `c`.
pub trait GridGeometry {
    /// The cell containing `point`.
    fn world_to_cell(&self, point: Vec2) -> GridCoord;

    /// World-space center of `cell`.
    fn cell_center(&self, cell: GridCoord) -> Vec2;
}

/// Axis-aligned square cells of side `cell_size`, with cell `(0, 0)`
/// spanning `[origin, origin + cell_size)`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UniformGrid {
    origin:    Vec2,
    cell_size: f32,
}

impl UniformGrid {
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidCellSize`] unless `cell_size` is
    /// positive and finite.
    pub fn new(origin: Vec2, cell_size: f32) -> SpatialResult<Self> {
        if !(cell_size > 0.0 && cell_size.is_finite()) {
            return Err(SpatialError::InvalidCellSize(cell_size));
        }
        Ok(Self { origin, cell_size })
    }

    /// One world unit per cell, cell `(0, 0)` at the world origin.
    pub fn unit() -> Self {
        Self { origin: Vec2::ZERO, cell_size: 1.0 }
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }
}

impl Default for UniformGrid {
    fn default() -> Self {
        Self::unit()
    }
}

impl GridGeometry for UniformGrid {
    #[inline]
    fn world_to_cell(&self, point: Vec2) -> GridCoord {
        let local = (point - self.origin) / self.cell_size;
        GridCoord::new(local.x.floor() as i32, local.y.floor() as i32)
    }

    #[inline]
    fn cell_center(&self, cell: GridCoord) -> Vec2 {
        self.origin + (Vec2::new(cell.x as f32, cell.y as f32) + Vec2::splat(0.5)) * self.cell_size
    }
}
