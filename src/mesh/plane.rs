//! Oriented planes and polygon classification/splitting for the BSP booleans.

use crate::float_types::{EPSILON, Real};
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use nalgebra::{Point3, Vector3};

// Plane classification constants; a polygon's class is the bitwise OR of its vertices'.
pub const COPLANAR: i8 = 0;
pub const FRONT: i8 = 1;
pub const BACK: i8 = 2;
pub const SPANNING: i8 = 3;

/// A plane `normal · p = w` with a unit normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub normal: Vector3<Real>,
    pub w: Real,
}

/// The four buckets produced by [`Plane::split_polygon`]:
/// `(coplanar_front, coplanar_back, front, back)`.
pub type SplitBuckets<S> = (Vec<Polygon<S>>, Vec<Polygon<S>>, Vec<Polygon<S>>, Vec<Polygon<S>>);

impl Plane {
    /// Create a plane from a (not necessarily unit) normal and offset.
    ///
    /// Returns `None` for a zero-length normal.
    pub fn from_normal(normal: Vector3<Real>, w: Real) -> Option<Self> {
        let len = normal.norm();
        if len <= Real::EPSILON {
            return None;
        }
        Some(Plane {
            normal: normal / len,
            w: w / len,
        })
    }

    /// Plane through three points, normal by the right-hand rule `(b-a) × (c-a)`.
    pub fn from_points(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Option<Self> {
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len <= Real::EPSILON {
            return None;
        }
        let normal = n / len;
        Some(Plane {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    /// Best-fit plane of a polygon's vertices using Newell's method, which stays
    /// stable for slightly non-planar or nearly degenerate rings.
    pub fn from_vertices(vertices: &[Vertex]) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let mut normal = Vector3::<Real>::zeros();
        let mut centroid = Vector3::<Real>::zeros();
        for (curr, next) in vertices.iter().zip(vertices.iter().cycle().skip(1)) {
            normal.x += (curr.pos.y - next.pos.y) * (curr.pos.z + next.pos.z);
            normal.y += (curr.pos.z - next.pos.z) * (curr.pos.x + next.pos.x);
            normal.z += (curr.pos.x - next.pos.x) * (curr.pos.y + next.pos.y);
            centroid += curr.pos.coords;
        }
        centroid /= vertices.len() as Real;
        let len = normal.norm();
        if len <= Real::EPSILON {
            return None;
        }
        let normal = normal / len;
        Some(Plane {
            normal,
            w: normal.dot(&centroid),
        })
    }

    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    pub const fn offset(&self) -> Real {
        self.w
    }

    /// Flip the plane (reverse normal and distance)
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    /// Signed distance of `point` from the plane (positive in front).
    pub fn signed_distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    /// Classify a point as `FRONT`, `BACK` or `COPLANAR` within [`EPSILON`].
    pub fn orient_point(&self, point: &Point3<Real>) -> i8 {
        let t = self.signed_distance(point);
        if t < -EPSILON {
            BACK
        } else if t > EPSILON {
            FRONT
        } else {
            COPLANAR
        }
    }

    /// Bitwise-OR classification of every vertex of `polygon`.
    pub fn classify_polygon<S: Clone>(&self, polygon: &Polygon<S>) -> i8 {
        polygon
            .vertices
            .iter()
            .fold(COPLANAR, |acc, v| acc | self.orient_point(&v.pos))
    }

    /// Split `polygon` by this plane.
    ///
    /// Coplanar polygons go to `coplanar_front` or `coplanar_back` depending on
    /// whether their plane faces the same way as this one. Spanning polygons are
    /// cut in two; both halves keep the parent polygon's plane so that thin
    /// slivers cannot end up with a degenerate recomputed normal.
    pub fn split_polygon<S: Clone>(&self, polygon: &Polygon<S>) -> SplitBuckets<S> {
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();

        let types: Vec<i8> = polygon
            .vertices
            .iter()
            .map(|v| self.orient_point(&v.pos))
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, &t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            },
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            _ => {
                let n = polygon.vertices.len();
                let mut split_front = Vec::with_capacity(n + 1);
                let mut split_back = Vec::with_capacity(n + 1);

                for i in 0..n {
                    let j = (i + 1) % n;
                    let (type_i, type_j) = (types[i], types[j]);
                    let vertex_i = &polygon.vertices[i];
                    let vertex_j = &polygon.vertices[j];

                    if type_i != BACK {
                        split_front.push(vertex_i.clone());
                    }
                    if type_i != FRONT {
                        split_back.push(vertex_i.clone());
                    }

                    if (type_i | type_j) == SPANNING {
                        let denom = self.normal.dot(&(vertex_j.pos - vertex_i.pos));
                        if denom.abs() > Real::EPSILON {
                            let t = (self.w - self.normal.dot(&vertex_i.pos.coords)) / denom;
                            let vertex_new = vertex_i.interpolate(vertex_j, t);
                            split_front.push(vertex_new.clone());
                            split_back.push(vertex_new);
                        }
                    }
                }

                if split_front.len() >= 3 {
                    front.push(Polygon::with_plane(
                        split_front,
                        polygon.plane.clone(),
                        polygon.metadata.clone(),
                    ));
                }
                if split_back.len() >= 3 {
                    back.push(Polygon::with_plane(
                        split_back,
                        polygon.plane.clone(),
                        polygon.metadata.clone(),
                    ));
                }
            },
        }

        (coplanar_front, coplanar_back, front, back)
    }
}
