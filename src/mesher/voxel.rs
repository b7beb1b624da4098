//! Blocky fallback mesher: one small cuboid per skeleton point.

use crate::float_types::Real;
use crate::indexed_mesh::IndexedMesh;
use crate::loft::VoxelSkeleton;
use crate::mesher::{GridFrame, LimbMesher};
use nalgebra::Vector3;
use tracing::debug;

/// Corner signs of a cuboid, `-` meaning min and `+` max on that axis.
const CORNERS: [[Real; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Two outward triangles per face: -z, +z, -y, +y, -x, +x.
const TRIANGLES: [[u32; 3]; 12] = [
    [0, 3, 2],
    [0, 2, 1],
    [4, 5, 6],
    [4, 6, 7],
    [0, 1, 5],
    [0, 5, 4],
    [3, 7, 6],
    [3, 6, 2],
    [0, 4, 7],
    [0, 7, 3],
    [1, 2, 6],
    [1, 6, 5],
];

/// Emits an axis-aligned cuboid with half size `cell_size * 0.25` centred on
/// every skeleton point. Neighbouring cuboids do not share vertices.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoxelMesher;

impl VoxelMesher {
    pub const fn new() -> Self {
        VoxelMesher
    }
}

impl LimbMesher for VoxelMesher {
    fn mesh(&self, skeleton: &VoxelSkeleton, frame: &GridFrame) -> IndexedMesh {
        if skeleton.is_empty() {
            return IndexedMesh::empty();
        }

        let half = frame.cell_size * 0.25;
        let mut vertices = Vec::with_capacity(skeleton.len() * 8);
        let mut indices = Vec::with_capacity(skeleton.len() * 12);

        for point in skeleton.points() {
            let center = frame.point_to_world(point);
            let base = vertices.len() as u32;
            vertices.extend(
                CORNERS
                    .iter()
                    .map(|s| center + Vector3::new(s[0], s[1], s[2]) * half),
            );
            indices.extend(TRIANGLES.iter().map(|t| t.map(|i| base + i)));
        }

        debug!(
            points = skeleton.len(),
            triangles = indices.len(),
            "voxel mesh built"
        );

        // cuboids share no vertices, so averaged face normals stay per cuboid
        IndexedMesh::new(vertices, indices, None).with_smooth_normals()
    }
}
