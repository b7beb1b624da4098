//! Voxel skeleton → triangle mesh.
//!
//! Two strategies sit behind [`LimbMesher`]: a blocky [`VoxelMesher`] and the
//! smooth [`MarchingCubesMesher`]. Both return the sentinel
//! [`IndexedMesh::empty`] for an empty skeleton.

use crate::errors::{GeometryError, GeometryResult};
use crate::float_types::Real;
use crate::indexed_mesh::IndexedMesh;
use crate::loft::{LoftConfig, SkeletonPoint, VoxelSkeleton};
use crate::sketch::DEFAULT_GRID_SIZE;
use nalgebra::Point3;

pub mod marching_cubes;
pub mod tables;
pub mod voxel;

pub use marching_cubes::{MarchingCubesConfig, MarchingCubesMesher};
pub use voxel::VoxelMesher;

/// Maps skeleton coordinates (row, col, height) into world space.
///
/// The grid is centred on the Y axis: `x = (col - (N-1)/2) * cell_size`,
/// `z = (row - (N-1)/2) * cell_size`, and `y` is the skeleton height as is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFrame {
    pub grid_size: usize,
    pub cell_size: Real,
}

impl Default for GridFrame {
    fn default() -> Self {
        GridFrame {
            grid_size: DEFAULT_GRID_SIZE,
            cell_size: 1.0,
        }
    }
}

impl From<&LoftConfig> for GridFrame {
    fn from(config: &LoftConfig) -> Self {
        GridFrame {
            grid_size: config.grid_size,
            ..GridFrame::default()
        }
    }
}

impl GridFrame {
    pub const fn with_cell_size(mut self, cell_size: Real) -> Self {
        self.cell_size = cell_size;
        self
    }

    fn half_extent(&self) -> Real {
        (self.grid_size as Real - 1.0) * 0.5
    }

    /// World position of fractional grid coordinates at world height `y`.
    pub fn to_world(&self, row: Real, col: Real, y: Real) -> Point3<Real> {
        let c = self.half_extent();
        Point3::new((col - c) * self.cell_size, y, (row - c) * self.cell_size)
    }

    pub fn point_to_world(&self, p: &SkeletonPoint) -> Point3<Real> {
        self.to_world(p.row, p.col, p.y)
    }

    pub fn validate(&self) -> GeometryResult<()> {
        if self.grid_size == 0 {
            return Err(GeometryError::InvalidConfig("grid_size must be at least 1".into()));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(GeometryError::InvalidConfig(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        Ok(())
    }
}

/// Strategy turning a voxel skeleton into a limb surface.
pub trait LimbMesher {
    /// Mesh `skeleton`, placing it in the world with `frame`.
    ///
    /// An empty skeleton yields [`IndexedMesh::empty`], never an error.
    fn mesh(&self, skeleton: &VoxelSkeleton, frame: &GridFrame) -> IndexedMesh;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn frame_centres_grid_on_y_axis() {
        let frame = GridFrame::default();
        assert_relative_eq!(frame.to_world(9.5, 9.5, 3.0), Point3::new(0.0, 3.0, 0.0));
        assert_relative_eq!(frame.to_world(0.0, 19.0, 0.0), Point3::new(9.5, 0.0, -9.5));
    }

    #[test]
    fn cell_size_scales_the_plane_only() {
        let frame = GridFrame::default().with_cell_size(2.0);
        assert_relative_eq!(frame.to_world(10.5, 9.5, 4.0), Point3::new(0.0, 4.0, 2.0));
        assert!(GridFrame::default().with_cell_size(0.0).validate().is_err());
    }
}
