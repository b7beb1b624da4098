//! `Mesh` struct and implementations of the `CSG` trait for `Mesh`

use crate::float_types::{
    Real,
    parry3d::bounding_volume::{Aabb, BoundingVolume},
};
use crate::mesh::{bsp::Node, polygon::Polygon, vertex::Vertex};
use crate::traits::CSG;
use nalgebra::{Matrix4, Point3};
use std::{fmt::Debug, sync::OnceLock};

pub mod bsp;
pub mod convex_hull;
pub mod manifold;
pub mod plane;
pub mod polygon;
pub mod shapes;
pub mod vertex;

/// A polygon soup solid, the working representation of the boolean engine.
#[derive(Clone, Debug)]
pub struct Mesh<S: Clone + Send + Sync + Debug> {
    /// 3D polygons for volumetric shapes
    pub polygons: Vec<Polygon<S>>,

    /// Lazily calculated AABB that spans `polygons`.
    pub bounding_box: OnceLock<Aabb>,

    /// Metadata
    pub metadata: Option<S>,
}

impl<S: Clone + Send + Sync + Debug> Mesh<S> {
    /// Build a Mesh from an existing polygon list
    pub fn from_polygons(polygons: &[Polygon<S>], metadata: Option<S>) -> Self {
        let mut mesh = Mesh::new();
        mesh.polygons = polygons.to_vec();
        mesh.metadata = metadata;
        mesh
    }

    /// Build a Mesh from raw triangles, dropping any zero-area triangle.
    pub fn from_triangles<I>(triangles: I, metadata: Option<S>) -> Self
    where
        I: IntoIterator<Item = [Point3<Real>; 3]>,
    {
        let polygons = triangles
            .into_iter()
            .filter_map(|[a, b, c]| {
                let normal = (b - a).cross(&(c - a));
                let normal = normal.try_normalize(Real::EPSILON)?;
                Polygon::new(
                    vec![
                        Vertex::new(a, normal),
                        Vertex::new(b, normal),
                        Vertex::new(c, normal),
                    ],
                    metadata.clone(),
                )
            })
            .collect();

        Mesh {
            polygons,
            bounding_box: OnceLock::new(),
            metadata,
        }
    }

    /// True when the mesh holds no polygons.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Split polygons into (may_touch, cannot_touch) using bounding‑box tests
    fn partition_polys(
        polys: &[Polygon<S>],
        other_bb: &Aabb,
    ) -> (Vec<Polygon<S>>, Vec<Polygon<S>>) {
        let mut maybe = Vec::new();
        let mut never = Vec::new();
        for p in polys {
            if p.bounding_box().intersects(other_bb) {
                maybe.push(p.clone());
            } else {
                never.push(p.clone());
            }
        }
        (maybe, never)
    }

    /// Triangulate each polygon in the Mesh returning a Mesh containing triangles
    pub fn triangulate(&self) -> Mesh<S> {
        let triangles = self
            .polygons
            .iter()
            .flat_map(|poly| {
                poly.triangulate().into_iter().map(move |tri| {
                    Polygon::with_plane(tri.to_vec(), poly.plane.clone(), poly.metadata.clone())
                })
            })
            .collect::<Vec<_>>();

        Mesh::from_polygons(&triangles, self.metadata.clone())
    }

    /// Every vertex of every polygon, in polygon order (duplicates included).
    pub fn vertices(&self) -> Vec<Vertex> {
        self.polygons
            .iter()
            .flat_map(|p| p.vertices.iter().cloned())
            .collect()
    }

    /// True when every vertex of every polygon is finite.
    pub fn is_finite(&self) -> bool {
        self.polygons
            .iter()
            .all(|p| p.vertices.iter().all(Vertex::is_finite))
    }
}

impl<S: Clone + Send + Sync + Debug> CSG for Mesh<S> {
    /// Returns a new empty Mesh
    fn new() -> Self {
        Mesh {
            polygons: Vec::new(),
            bounding_box: OnceLock::new(),
            metadata: None,
        }
    }

    /// Return a new Mesh representing union of the two Meshes.
    ///
    /// ```text
    /// let c = a.union(b);
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   c   |
    ///     |    +--+----+   =   |       +----+
    ///     +----+--+    |       +----+       |
    ///          |   b   |            |   c   |
    ///          |       |            |       |
    ///          +-------+            +-------+
    /// ```
    fn union(&self, other: &Mesh<S>) -> Mesh<S> {
        // avoid splitting obvious non‑intersecting faces
        let (a_clip, a_passthru) = Self::partition_polys(&self.polygons, &other.bounding_box());
        let (b_clip, b_passthru) = Self::partition_polys(&other.polygons, &self.bounding_box());

        let mut a = Node::from_polygons(&a_clip);
        let mut b = Node::from_polygons(&b_clip);

        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(&b.all_polygons());

        // combine results and untouched faces
        let mut final_polys = a.all_polygons();
        final_polys.extend(a_passthru);
        final_polys.extend(b_passthru);

        Mesh {
            polygons: final_polys,
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }

    /// Return a new Mesh representing difference of the two Meshes.
    ///
    /// ```text
    /// let c = a.difference(b);
    ///     +-------+            +-------+
    ///     |       |            |       |
    ///     |   a   |            |   c   |
    ///     |    +--+----+   =   |    +--+
    ///     +----+--+    |       +----+
    ///          |   b   |
    ///          |       |
    ///          +-------+
    /// ```
    fn difference(&self, other: &Mesh<S>) -> Mesh<S> {
        // avoid splitting obvious non‑intersecting faces
        let (a_clip, a_passthru) = Self::partition_polys(&self.polygons, &other.bounding_box());
        let (b_clip, _b_passthru) = Self::partition_polys(&other.polygons, &self.bounding_box());

        let mut a = Node::from_polygons(&a_clip);
        let mut b = Node::from_polygons(&b_clip);

        a.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(&b.all_polygons());
        a.invert();

        // combine results and untouched faces
        let mut final_polys = a.all_polygons();
        final_polys.extend(a_passthru);

        Mesh {
            polygons: final_polys,
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }

    /// Return a new Mesh representing the intersection of the two Meshes.
    ///
    /// ```text
    /// let c = a.intersection(b);
    ///     +-------+
    ///     |       |
    ///     |   a   |
    ///     |    +--+----+   =   +--+
    ///     +----+--+    |       +--+
    ///          |   b   |
    ///          |       |
    ///          +-------+
    /// ```
    fn intersection(&self, other: &Mesh<S>) -> Mesh<S> {
        let mut a = Node::from_polygons(&self.polygons);
        let mut b = Node::from_polygons(&other.polygons);

        a.invert();
        b.clip_to(&a);
        b.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        a.build(&b.all_polygons());
        a.invert();

        Mesh {
            polygons: a.all_polygons(),
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }

    /// Apply an arbitrary 3D transform (as a 4x4 matrix) to Mesh.
    ///
    /// Polygons that collapse under a singular matrix are dropped.
    fn transform(&self, mat: &Matrix4<Real>) -> Mesh<S> {
        let normal_matrix = mat
            .try_inverse()
            .map(|inv| inv.transpose())
            .unwrap_or_else(Matrix4::identity);
        // a mirroring transform turns the winding inside out
        let mirrored = mat.fixed_view::<3, 3>(0, 0).determinant() < 0.0;

        let polygons = self
            .polygons
            .iter()
            .filter_map(|poly| {
                let mut vertices: Vec<Vertex> = poly
                    .vertices
                    .iter()
                    .map(|v| v.transformed(mat, &normal_matrix))
                    .collect();
                if mirrored {
                    vertices.reverse();
                }
                // keep the cached plane consistent with the new vertex positions
                Polygon::new(vertices, poly.metadata.clone())
            })
            .collect();

        Mesh {
            polygons,
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }

    /// Returns a [`parry3d::bounding_volume::Aabb`] indicating the 3D bounds of all `polygons`.
    fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
            let mut maxs = Point3::new(-Real::MAX, -Real::MAX, -Real::MAX);

            for poly in &self.polygons {
                for v in &poly.vertices {
                    mins = mins.inf(&v.pos);
                    maxs = maxs.sup(&v.pos);
                }
            }

            // no polygons: a trivial AABB at origin
            if mins.x > maxs.x {
                return Aabb::new(Point3::origin(), Point3::origin());
            }

            Aabb::new(mins, maxs)
        })
    }

    /// Invert this Mesh (flip inside vs. outside)
    fn inverse(&self) -> Mesh<S> {
        let mut mesh = self.clone();
        for p in &mut mesh.polygons {
            p.flip();
        }
        mesh.bounding_box = OnceLock::new();
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn volume(mesh: &Mesh<()>) -> Real {
        mesh.triangulate()
            .polygons
            .iter()
            .map(|p| {
                let [a, b, c] = [&p.vertices[0].pos, &p.vertices[1].pos, &p.vertices[2].pos];
                a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
            })
            .sum()
    }

    #[test]
    fn union_of_disjoint_cubes_keeps_all_faces() {
        let a: Mesh<()> = Mesh::cube(1.0, None);
        let b = a.translate(3.0, 0.0, 0.0);
        let u = a.union(&b);
        assert_eq!(u.polygons.len(), 12);
        assert_relative_eq!(volume(&u), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn difference_removes_overlap_volume() {
        let a: Mesh<()> = Mesh::cube(2.0, None);
        let b: Mesh<()> = Mesh::cube(2.0, None).translate(1.0, 0.0, 0.0);
        let d = a.difference(&b);
        assert_relative_eq!(volume(&d), 4.0, epsilon = 1e-9);
        let bb = d.bounding_box();
        assert_relative_eq!(bb.maxs.x, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn intersection_keeps_overlap_volume() {
        let a: Mesh<()> = Mesh::cube(2.0, None);
        let b: Mesh<()> = Mesh::cube(2.0, None).translate(1.0, 1.0, 0.0);
        let i = a.intersection(&b);
        assert_relative_eq!(volume(&i), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn intersection_of_disjoint_is_empty() {
        let a: Mesh<()> = Mesh::cube(1.0, None);
        let b = a.translate(5.0, 0.0, 0.0);
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn transform_with_zero_scale_collapses() {
        let a: Mesh<()> = Mesh::cube(1.0, None);
        assert!(a.scale(0.0, 0.0, 0.0).is_empty());
        // a flattened cube still keeps the two faces lying in the squashed plane
        assert_eq!(a.scale(0.0, 1.0, 1.0).polygons.len(), 2);
    }

    #[test]
    fn mirroring_keeps_faces_outward() {
        let a: Mesh<()> = Mesh::cube(1.0, None);
        let mirrored = a.scale(-2.0, 2.0, 2.0);
        assert_relative_eq!(volume(&mirrored), 8.0, epsilon = 1e-9);
        for poly in &mirrored.polygons {
            let c = poly.vertices[0].pos.coords;
            assert!(poly.plane.normal.dot(&c) > 0.0);
            assert!(poly.vertices.iter().all(|v| v.normal.dot(&poly.plane.normal) > 0.0));
        }
        let other = Mesh::cube(2.0, None).translate(5.0, 0.0, 0.0);
        assert_relative_eq!(volume(&mirrored.union(&other)), 16.0, epsilon = 1e-9);
    }

    #[test]
    fn inverse_negates_volume() {
        let a: Mesh<()> = Mesh::cube(1.0, None);
        assert_relative_eq!(volume(&a.inverse()), -1.0, epsilon = 1e-9);
    }
}
