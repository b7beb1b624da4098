//! Convex planar polygons, the unit of work of the BSP booleans.

use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::mesh::plane::Plane;
use crate::mesh::vertex::Vertex;
use nalgebra::Point3;

/// A convex polygon in 3D with a cached supporting plane.
/// - `S` is the generic metadata type, stored as `Option<S>`.
#[derive(Debug, Clone)]
pub struct Polygon<S: Clone> {
    /// Vertices in counter-clockwise order seen from the front (outside).
    pub vertices: Vec<Vertex>,

    /// The plane on which this Polygon lies, used for splitting
    pub plane: Plane,

    /// Generic metadata associated with the Polygon
    pub metadata: Option<S>,
}

impl<S: Clone> Polygon<S> {
    /// Create a polygon from vertices, computing its plane.
    ///
    /// Returns `None` for fewer than three vertices or a zero-area ring.
    pub fn new(vertices: Vec<Vertex>, metadata: Option<S>) -> Option<Self> {
        let plane = Plane::from_vertices(&vertices)?;
        Some(Polygon {
            vertices,
            plane,
            metadata,
        })
    }

    /// Create a polygon that reuses an already known plane (split fragments).
    pub const fn with_plane(vertices: Vec<Vertex>, plane: Plane, metadata: Option<S>) -> Self {
        Polygon {
            vertices,
            plane,
            metadata,
        }
    }

    /// Reverses winding order and flips the plane and vertex normals
    pub fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.flip();
        }
        self.plane.flip();
    }

    /// Axis aligned bounding box of this polygon
    pub fn bounding_box(&self) -> Aabb {
        let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
        let mut maxs = Point3::new(-Real::MAX, -Real::MAX, -Real::MAX);
        for v in &self.vertices {
            mins = mins.inf(&v.pos);
            maxs = maxs.sup(&v.pos);
        }
        Aabb::new(mins, maxs)
    }

    /// Fan-triangulate the polygon. Valid because every polygon this crate
    /// builds or splits stays convex.
    pub fn triangulate(&self) -> Vec<[Vertex; 3]> {
        let n = self.vertices.len();
        if n < 3 {
            return Vec::new();
        }
        (1..n - 1)
            .map(|i| {
                [
                    self.vertices[0].clone(),
                    self.vertices[i].clone(),
                    self.vertices[i + 1].clone(),
                ]
            })
            .collect()
    }

    /// Area of the (planar, convex) polygon.
    pub fn area(&self) -> Real {
        self.triangulate()
            .iter()
            .map(|[a, b, c]| (b.pos - a.pos).cross(&(c.pos - a.pos)).norm() * 0.5)
            .sum()
    }
}
