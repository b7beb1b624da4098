//! Smooth limb surface: marching cubes over a distance field of the skeleton.
//!
//! The field at a lattice sample is `shell_thickness - d`, where `d` is the
//! distance to the nearest skeleton point measured in grid units, the height
//! axis rescaled by `max(row_range, col_range) / height_range` so the surface
//! is not stretched along Y. A corner is inside when its value exceeds
//! `-inflation`.

use crate::errors::{GeometryError, GeometryResult};
use crate::float_types::Real;
use crate::indexed_mesh::IndexedMesh;
use crate::loft::{SkeletonPoint, VoxelSkeleton};
use crate::mesher::tables::{CORNER_OFFSETS, EDGE_CONNECTIONS, EDGE_TABLE, TRI_TABLE};
use crate::mesher::{GridFrame, LimbMesher};
use nalgebra::Point3;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Marching cubes parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchingCubesConfig {
    /// Lattice samples per axis.
    pub resolution: usize,
    /// Distance from the skeleton at which the surface sits, in grid units.
    pub shell_thickness: Real,
    /// Iso-level bias; positive values grow the surface.
    pub inflation: Real,
    /// Weld coincident vertices and average normals, otherwise flat shading.
    pub smooth_normals: bool,
    /// Row/col margin around the skeleton. `None` uses `thickness + inflation + 2`.
    pub padding: Option<Real>,
    /// Place vertices at the linear root along each edge instead of its midpoint.
    pub interpolate_edges: bool,
}

impl Default for MarchingCubesConfig {
    fn default() -> Self {
        MarchingCubesConfig {
            resolution: 32,
            shell_thickness: 1.5,
            inflation: 0.0,
            smooth_normals: true,
            padding: None,
            interpolate_edges: false,
        }
    }
}

impl MarchingCubesConfig {
    pub const fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    pub const fn with_shell_thickness(mut self, thickness: Real) -> Self {
        self.shell_thickness = thickness;
        self
    }

    pub const fn with_inflation(mut self, inflation: Real) -> Self {
        self.inflation = inflation;
        self
    }

    pub const fn with_smooth_normals(mut self, smooth: bool) -> Self {
        self.smooth_normals = smooth;
        self
    }

    pub const fn with_padding(mut self, padding: Option<Real>) -> Self {
        self.padding = padding;
        self
    }

    pub const fn with_interpolate_edges(mut self, interpolate: bool) -> Self {
        self.interpolate_edges = interpolate;
        self
    }

    /// The iso-level: corners with a field value above it are inside.
    pub fn iso_level(&self) -> Real {
        -self.inflation
    }

    /// Distance from the skeleton at which the field crosses the iso-level.
    pub fn surface_offset(&self) -> Real {
        self.shell_thickness + self.inflation
    }

    /// Row/col padding actually used.
    pub fn effective_padding(&self) -> Real {
        self.padding.unwrap_or(self.surface_offset() + 2.0)
    }

    pub fn validate(&self) -> GeometryResult<()> {
        if self.resolution < 2 {
            return Err(GeometryError::InvalidConfig(format!(
                "resolution must be at least 2, got {}",
                self.resolution
            )));
        }
        if !(self.shell_thickness.is_finite() && self.shell_thickness > 0.0) {
            return Err(GeometryError::InvalidConfig(format!(
                "shell_thickness must be positive, got {}",
                self.shell_thickness
            )));
        }
        if !self.inflation.is_finite() || self.surface_offset() <= 0.0 {
            return Err(GeometryError::InvalidConfig(format!(
                "inflation {} leaves no surface",
                self.inflation
            )));
        }
        if let Some(p) = self.padding {
            if !(p.is_finite() && p > 0.0) {
                return Err(GeometryError::InvalidConfig(format!(
                    "padding must be positive, got {p}"
                )));
            }
        }
        Ok(())
    }
}

/// Sampling lattice over the padded skeleton bounds.
///
/// Axis 0 runs along `col`, axis 1 along height, axis 2 along `row`, so the
/// lattice has the same handedness as world `x, y, z`.
#[derive(Debug, Clone, PartialEq)]
struct Lattice {
    resolution: usize,
    /// Lower corner in (col, y, row).
    origin: [Real; 3],
    /// Sample spacing per axis.
    step: [Real; 3],
    /// Height-to-grid metric factor.
    y_to_grid: Real,
}

impl Lattice {
    fn new(skeleton: &VoxelSkeleton, config: &MarchingCubesConfig) -> Option<Self> {
        let [(row_min, row_max), (col_min, col_max), (y_min, y_max)] = skeleton.bounds()?;
        let offset = config.surface_offset();
        let pad = config.effective_padding();
        if pad <= offset {
            warn!(
                padding = pad,
                offset, "padding does not exceed the surface offset; the surface will be clipped open"
            );
        }

        let row_range = row_max - row_min + 2.0 * pad;
        let col_range = col_max - col_min + 2.0 * pad;
        let plane_range = row_range.max(col_range);
        let span = y_max - y_min;

        // The scaled height margin must also exceed the offset so the top and
        // bottom close; grow it beyond max(0.3 * span, 3) when the limb is tall
        // and narrow.
        let mut y_pad = (0.3 * span).max(3.0);
        let slack = plane_range - 2.0 * offset;
        if pad > offset && slack > 0.0 {
            y_pad = y_pad.max(1.25 * offset * span / slack);
        }
        let height_range = span + 2.0 * y_pad;

        let cells = (config.resolution - 1) as Real;
        Some(Lattice {
            resolution: config.resolution,
            origin: [col_min - pad, y_min - y_pad, row_min - pad],
            step: [col_range / cells, height_range / cells, row_range / cells],
            y_to_grid: plane_range / height_range,
        })
    }

    const fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + j * self.resolution + k * self.resolution * self.resolution
    }

    /// (col, y, row) at fractional lattice coordinates.
    fn coords(&self, l: [Real; 3]) -> [Real; 3] {
        [
            self.origin[0] + l[0] * self.step[0],
            self.origin[1] + l[1] * self.step[1],
            self.origin[2] + l[2] * self.step[2],
        ]
    }

    fn field_at(&self, flat: usize, skeleton: &[SkeletonPoint], offset: Real) -> Real {
        let r = self.resolution;
        let (i, j, k) = (flat % r, (flat / r) % r, flat / (r * r));
        let [col, y, row] = self.coords([i as Real, j as Real, k as Real]);
        let nearest_sq = skeleton
            .iter()
            .map(|p| {
                let dr = row - p.row;
                let dc = col - p.col;
                let dy = (y - p.y) * self.y_to_grid;
                dr * dr + dc * dc + dy * dy
            })
            .fold(Real::MAX, Real::min);
        offset - nearest_sq.sqrt()
    }

    /// Field values for every lattice sample, laid out by [`Lattice::index`].
    fn sample(&self, skeleton: &VoxelSkeleton, thickness: Real) -> Vec<Real> {
        let total = self.resolution * self.resolution * self.resolution;
        let points = skeleton.points();

        #[cfg(feature = "parallel")]
        let field = (0..total)
            .into_par_iter()
            .map(|flat| self.field_at(flat, points, thickness))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let field = (0..total)
            .map(|flat| self.field_at(flat, points, thickness))
            .collect();

        field
    }
}

/// Extracts a smooth iso-surface from a distance field of the skeleton.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarchingCubesMesher {
    pub config: MarchingCubesConfig,
}

impl MarchingCubesMesher {
    pub const fn new(config: MarchingCubesConfig) -> Self {
        MarchingCubesMesher { config }
    }

    /// Triangles in fractional lattice coordinates, wound outward.
    fn polygonise(&self, lattice: &Lattice, field: &[Real]) -> Vec<[[Real; 3]; 3]> {
        let r = lattice.resolution;
        let iso = self.config.iso_level();
        let mut triangles = Vec::new();

        for k in 0..r - 1 {
            for j in 0..r - 1 {
                for i in 0..r - 1 {
                    let corners = CORNER_OFFSETS.map(|[dx, dy, dz]| [i + dx, j + dy, k + dz]);
                    let values = corners.map(|[a, b, c]| field[lattice.index(a, b, c)]);

                    let cube_index = values
                        .iter()
                        .enumerate()
                        .filter(|(_, v)| **v > iso)
                        .fold(0usize, |acc, (bit, _)| acc | (1 << bit));
                    let crossed = EDGE_TABLE[cube_index];
                    if crossed == 0 {
                        continue;
                    }

                    let edge_point = |edge: usize| -> [Real; 3] {
                        let [c0, c1] = EDGE_CONNECTIONS[edge];
                        // order the corners by lattice position so neighbouring cells agree
                        let (a, b) = if corners[c0] <= corners[c1] { (c0, c1) } else { (c1, c0) };
                        let t = if self.config.interpolate_edges {
                            let denom = values[b] - values[a];
                            if denom.abs() > Real::EPSILON {
                                ((iso - values[a]) / denom).clamp(0.0, 1.0)
                            } else {
                                0.5
                            }
                        } else {
                            0.5
                        };
                        let (pa, pb) = (corners[a], corners[b]);
                        [0, 1, 2].map(|axis| pa[axis] as Real + (pb[axis] as Real - pa[axis] as Real) * t)
                    };

                    for tri in TRI_TABLE[cube_index].chunks_exact(3) {
                        if tri[0] < 0 {
                            break;
                        }
                        let edges = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
                        if edges.iter().any(|&e| crossed & (1 << e) == 0) {
                            continue;
                        }
                        // table triangles face the inside corners; reverse them
                        triangles.push([edge_point(edges[0]), edge_point(edges[2]), edge_point(edges[1])]);
                    }
                }
            }
        }
        triangles
    }
}

impl LimbMesher for MarchingCubesMesher {
    fn mesh(&self, skeleton: &VoxelSkeleton, frame: &GridFrame) -> IndexedMesh {
        if self.config.resolution < 2 {
            warn!(resolution = self.config.resolution, "lattice too coarse to mesh");
            return IndexedMesh::empty();
        }
        let Some(lattice) = Lattice::new(skeleton, &self.config) else {
            return IndexedMesh::empty();
        };

        let field = lattice.sample(skeleton, self.config.shell_thickness);
        let raw = self.polygonise(&lattice, &field);

        let to_world = |l: [Real; 3]| -> Point3<Real> {
            let [col, y, row] = lattice.coords(l);
            frame.to_world(row, col, y)
        };
        let triangles = raw.into_iter().map(|tri| tri.map(to_world));

        let welded = IndexedMesh::from_triangles(triangles);
        let mesh = if welded.is_empty() {
            welded
        } else if self.config.smooth_normals {
            welded.with_smooth_normals()
        } else {
            welded.flat_shaded()
        };

        debug!(
            skeleton = skeleton.len(),
            resolution = lattice.resolution,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "marching cubes surface extracted"
        );
        mesh
    }
}
