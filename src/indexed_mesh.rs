//! `IndexedMesh`: shared vertex positions plus triangle indices, the mesh
//! shape every pipeline stage hands to its caller.

use crate::errors::{GeometryError, GeometryResult};
use crate::float_types::{Real, parry3d::bounding_volume::Aabb, tolerance};
use crate::mesh::{Mesh, convex_hull::hull_triangles, vertex::Vertex};
use crate::triangulated::Triangulated3D;
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

/// Triangle mesh with optional per-vertex normals.
///
/// Triangles are wound counter-clockwise seen from outside.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedMesh {
    pub vertices: Vec<Point3<Real>>,
    pub indices: Vec<[u32; 3]>,
    pub normals: Option<Vec<Vector3<Real>>>,
}

/// Quantized position used to compare vertices across triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct PositionKey(i64, i64, i64);

impl PositionKey {
    fn new(p: &Point3<Real>, tol: Real) -> Self {
        PositionKey(
            (p.x / tol).round() as i64,
            (p.y / tol).round() as i64,
            (p.z / tol).round() as i64,
        )
    }
}

impl Default for IndexedMesh {
    fn default() -> Self {
        Self::empty()
    }
}

impl IndexedMesh {
    pub const fn new(
        vertices: Vec<Point3<Real>>,
        indices: Vec<[u32; 3]>,
        normals: Option<Vec<Vector3<Real>>>,
    ) -> Self {
        IndexedMesh {
            vertices,
            indices,
            normals,
        }
    }

    /// The "present but empty" sentinel: a single vertex at the origin and no
    /// triangles.
    pub fn empty() -> Self {
        IndexedMesh {
            vertices: vec![Point3::origin()],
            indices: Vec::new(),
            normals: None,
        }
    }

    /// Build a mesh from a triangle soup, welding coincident corners and
    /// dropping triangles that collapse in the process.
    pub fn from_triangles<I>(triangles: I) -> Self
    where
        I: IntoIterator<Item = [Point3<Real>; 3]>,
    {
        let tol = tolerance();
        let mut lookup: HashMap<PositionKey, u32> = HashMap::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for tri in triangles {
            let idx = tri.map(|p| {
                *lookup.entry(PositionKey::new(&p, tol)).or_insert_with(|| {
                    vertices.push(p);
                    (vertices.len() - 1) as u32
                })
            });
            if idx[0] != idx[1] && idx[1] != idx[2] && idx[0] != idx[2] {
                indices.push(idx);
            }
        }

        if indices.is_empty() {
            return Self::empty();
        }
        IndexedMesh::new(vertices, indices, None)
    }

    /// Fan-triangulate every polygon of a BSP mesh and weld the result.
    pub fn from_mesh<S: Clone + Send + Sync + Debug>(mesh: &Mesh<S>) -> Self {
        Self::from_triangles(
            mesh.polygons
                .iter()
                .flat_map(|poly| poly.triangulate())
                .map(|[a, b, c]| [a.pos, b.pos, c.pos]),
        )
    }

    /// Convert to the polygon soup the boolean engine works on.
    ///
    /// Zero-area triangles are skipped.
    pub fn to_mesh<S: Clone + Send + Sync + Debug>(&self, metadata: Option<S>) -> Mesh<S> {
        Mesh::from_triangles(self.triangles(), metadata)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Check that every index points at a vertex and that normals, when
    /// present, match the vertices one to one.
    pub fn validate(&self) -> GeometryResult<()> {
        let count = self.vertices.len();
        if let Some((t, tri)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, tri)| tri.iter().any(|&i| i as usize >= count))
        {
            return Err(GeometryError::InvalidMesh(format!(
                "triangle {t} {tri:?} indexes past {count} vertices"
            )));
        }
        if let Some(normals) = &self.normals {
            if normals.len() != count {
                return Err(GeometryError::InvalidMesh(format!(
                    "{} normals for {count} vertices",
                    normals.len()
                )));
            }
        }
        Ok(())
    }

    /// True when the mesh has no triangles (the sentinel, or any degenerate mesh).
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Corner positions of every triangle.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<Real>; 3]> + '_ {
        self.indices
            .iter()
            .map(|t| t.map(|i| self.vertices[i as usize]))
    }

    /// Highest `y` of any vertex, `None` when there are no vertices.
    pub fn max_y(&self) -> Option<Real> {
        self.vertices.iter().map(|p| p.y).reduce(Real::max)
    }

    /// Mean of all vertex positions, `None` when there are no vertices.
    pub fn centroid(&self) -> Option<Point3<Real>> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / self.vertices.len() as Real))
    }

    /// Axis aligned bounds of the vertices, `None` when there are no vertices.
    pub fn bounding_box(&self) -> Option<Aabb> {
        let first = self.vertices.first()?;
        let (mins, maxs) = self
            .vertices
            .iter()
            .fold((*first, *first), |(lo, hi), p| (lo.inf(p), hi.sup(p)));
        Some(Aabb::new(mins, maxs))
    }

    /// Signed enclosed volume (divergence theorem); positive for a closed,
    /// outward-wound surface.
    pub fn signed_volume(&self) -> Real {
        self.triangles()
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)) / 6.0)
            .sum()
    }

    /// Total triangle area.
    pub fn surface_area(&self) -> Real {
        self.triangles()
            .map(|[a, b, c]| (b - a).cross(&(c - a)).norm() * 0.5)
            .sum()
    }

    /// How many triangles use each undirected edge, with vertices compared by
    /// quantized position so duplicated (flat shaded) vertices still match.
    fn edge_use_counts(&self) -> HashMap<(PositionKey, PositionKey), u32> {
        let tol = tolerance();
        let mut counts = HashMap::new();
        for tri in self.triangles() {
            let keys = tri.map(|p| PositionKey::new(&p, tol));
            for (a, b) in [(keys[0], keys[1]), (keys[1], keys[2]), (keys[2], keys[0])] {
                let key = if a < b { (a, b) } else { (b, a) };
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Number of edges used by exactly one triangle (holes in the surface).
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_use_counts().values().filter(|&&c| c == 1).count()
    }

    /// True when the mesh has triangles and every edge is shared by exactly
    /// two of them.
    pub fn is_closed_manifold(&self) -> bool {
        !self.is_empty() && self.edge_use_counts().values().all(|&c| c == 2)
    }

    /// Merge vertices closer than `tol`, remap indices and drop triangles that
    /// collapse. Normals are discarded.
    pub fn weld(&self, tol: Real) -> IndexedMesh {
        let tol = tol.max(Real::EPSILON);
        let mut lookup: HashMap<PositionKey, u32> = HashMap::new();
        let mut vertices = Vec::with_capacity(self.vertices.len());
        let remap: Vec<u32> = self
            .vertices
            .iter()
            .map(|p| {
                *lookup.entry(PositionKey::new(p, tol)).or_insert_with(|| {
                    vertices.push(*p);
                    (vertices.len() - 1) as u32
                })
            })
            .collect();

        let indices: Vec<[u32; 3]> = self
            .indices
            .iter()
            .map(|t| t.map(|i| remap[i as usize]))
            .filter(|t| t[0] != t[1] && t[1] != t[2] && t[0] != t[2])
            .collect();

        if indices.is_empty() {
            return Self::empty();
        }
        IndexedMesh::new(vertices, indices, None)
    }

    /// Per-vertex normals by area-weighted averaging of incident face normals.
    pub fn with_smooth_normals(mut self) -> Self {
        let mut normals = vec![Vector3::zeros(); self.vertices.len()];
        for t in &self.indices {
            let [a, b, c] = t.map(|i| self.vertices[i as usize]);
            // unnormalized cross product weights by twice the area
            let face = (b - a).cross(&(c - a));
            for &i in t {
                normals[i as usize] += face;
            }
        }
        for n in &mut normals {
            *n = n.try_normalize(Real::EPSILON).unwrap_or_else(Vector3::y);
        }
        self.normals = Some(normals);
        self
    }

    /// Flat shading: three fresh vertices per triangle, each carrying its
    /// face normal.
    pub fn flat_shaded(&self) -> Self {
        if self.is_empty() {
            return Self::empty();
        }
        let mut vertices = Vec::with_capacity(self.indices.len() * 3);
        let mut normals = Vec::with_capacity(self.indices.len() * 3);
        let mut indices = Vec::with_capacity(self.indices.len());

        for [a, b, c] in self.triangles() {
            let n = (b - a)
                .cross(&(c - a))
                .try_normalize(Real::EPSILON)
                .unwrap_or_else(Vector3::y);
            let base = vertices.len() as u32;
            vertices.extend([a, b, c]);
            normals.extend([n, n, n]);
            indices.push([base, base + 1, base + 2]);
        }
        IndexedMesh::new(vertices, indices, Some(normals))
    }

    /// Convex hull of the vertex positions.
    pub fn convex_hull(&self) -> GeometryResult<IndexedMesh> {
        Ok(Self::from_triangles(hull_triangles(&self.vertices)?))
    }
}

impl Triangulated3D for IndexedMesh {
    fn visit_triangles<F>(&self, mut f: F)
    where
        F: FnMut([Vertex; 3]),
    {
        for [a, b, c] in self.triangles() {
            let n = (b - a)
                .cross(&(c - a))
                .try_normalize(Real::EPSILON)
                .unwrap_or_else(Vector3::zeros);
            f([Vertex::new(a, n), Vertex::new(b, n), Vertex::new(c, n)]);
        }
    }
}

impl<S: Clone + Send + Sync + Debug> Triangulated3D for Mesh<S> {
    fn visit_triangles<F>(&self, mut f: F)
    where
        F: FnMut([Vertex; 3]),
    {
        for poly in &self.polygons {
            for mut tri in poly.triangulate() {
                for v in &mut tri {
                    v.normal = poly.plane.normal;
                }
                f(tri);
            }
        }
    }
}
