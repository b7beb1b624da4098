//! Canonical 3D shapes as `Mesh`s, all centred on the origin.

use crate::float_types::{PI, Real, TAU};
use crate::mesh::Mesh;
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

impl<S: Clone + Debug + Send + Sync> Mesh<S> {
    /// Axis-aligned box spanning `min..max`.
    ///
    /// ## **Vertex Layout**
    /// ```text
    ///       7-------6
    ///      /|      /|
    ///     4-------5 |
    ///     | 3-----|-2
    ///     |/      |/
    ///     0-------1
    /// ```
    /// Faces are wound counter-clockwise seen from outside.
    pub fn cuboid(min: Point3<Real>, max: Point3<Real>, metadata: Option<S>) -> Mesh<S> {
        let corners = [
            Point3::new(min.x, min.y, min.z), // 0
            Point3::new(max.x, min.y, min.z), // 1
            Point3::new(max.x, max.y, min.z), // 2
            Point3::new(min.x, max.y, min.z), // 3
            Point3::new(min.x, min.y, max.z), // 4
            Point3::new(max.x, min.y, max.z), // 5
            Point3::new(max.x, max.y, max.z), // 6
            Point3::new(min.x, max.y, max.z), // 7
        ];

        let faces: [([usize; 4], Vector3<Real>); 6] = [
            ([0, 3, 2, 1], -Vector3::z()),
            ([4, 5, 6, 7], Vector3::z()),
            ([0, 1, 5, 4], -Vector3::y()),
            ([3, 7, 6, 2], Vector3::y()),
            ([0, 4, 7, 3], -Vector3::x()),
            ([1, 2, 6, 5], Vector3::x()),
        ];

        let polygons: Vec<Polygon<S>> = faces
            .iter()
            .filter_map(|(indices, normal)| {
                let vertices = indices
                    .iter()
                    .map(|&i| Vertex::new(corners[i], *normal))
                    .collect();
                Polygon::new(vertices, metadata.clone())
            })
            .collect();

        Mesh::from_polygons(&polygons, metadata)
    }

    /// Cube of edge length `size` centred on the origin.
    pub fn cube(size: Real, metadata: Option<S>) -> Mesh<S> {
        let h = size * 0.5;
        Self::cuboid(Point3::new(-h, -h, -h), Point3::new(h, h, h), metadata)
    }

    /// UV sphere centred on the origin.
    ///
    /// `segments` subdivide the azimuth θ, `stacks` the polar angle φ
    /// (φ = 0 at +Y). The polar rows collapse into triangles.
    pub fn sphere(radius: Real, segments: usize, stacks: usize, metadata: Option<S>) -> Mesh<S> {
        let segments = segments.max(3);
        let stacks = stacks.max(2);

        let vertex = |i: usize, j: usize| {
            let theta = i as Real / segments as Real * TAU;
            let phi = j as Real / stacks as Real * PI;
            let dir = Vector3::new(theta.cos() * phi.sin(), phi.cos(), theta.sin() * phi.sin());
            Vertex::new(Point3::from(dir * radius), dir)
        };

        let mut polygons = Vec::with_capacity(segments * stacks);
        for i in 0..segments {
            for j in 0..stacks {
                let mut vertices = Vec::with_capacity(4);
                vertices.push(vertex(i, j));
                if j > 0 {
                    vertices.push(vertex(i + 1, j));
                }
                if j < stacks - 1 {
                    vertices.push(vertex(i + 1, j + 1));
                }
                vertices.push(vertex(i, j + 1));

                if let Some(poly) = Polygon::new(vertices, metadata.clone()) {
                    polygons.push(poly);
                }
            }
        }

        Mesh::from_polygons(&polygons, metadata)
    }

    /// Cylinder centred on the origin with its axis along +Y, spanning
    /// `-height/2..height/2`.
    pub fn cylinder(radius: Real, height: Real, segments: usize, metadata: Option<S>) -> Mesh<S> {
        let segments = segments.max(3);
        let half = height * 0.5;
        let ring = |i: usize, y: Real| {
            let angle = i as Real / segments as Real * TAU;
            Point3::new(radius * angle.cos(), y, radius * angle.sin())
        };
        let bottom_center = Point3::new(0.0, -half, 0.0);
        let top_center = Point3::new(0.0, half, 0.0);

        let mut polygons = Vec::with_capacity(segments * 3);
        for i in 0..segments {
            let (b0, b1) = (ring(i, -half), ring(i + 1, -half));
            let (t0, t1) = (ring(i, half), ring(i + 1, half));

            // side normals point radially, caps along the axis
            let n0 = Vector3::new(b0.x, 0.0, b0.z).normalize();
            let n1 = Vector3::new(b1.x, 0.0, b1.z).normalize();

            let side = vec![
                Vertex::new(b0, n0),
                Vertex::new(t0, n0),
                Vertex::new(t1, n1),
                Vertex::new(b1, n1),
            ];
            let top = vec![
                Vertex::new(top_center, Vector3::y()),
                Vertex::new(t1, Vector3::y()),
                Vertex::new(t0, Vector3::y()),
            ];
            let bottom = vec![
                Vertex::new(bottom_center, -Vector3::y()),
                Vertex::new(b0, -Vector3::y()),
                Vertex::new(b1, -Vector3::y()),
            ];

            polygons.extend(
                [side, top, bottom]
                    .into_iter()
                    .filter_map(|vertices| Polygon::new(vertices, metadata.clone())),
            );
        }

        Mesh::from_polygons(&polygons, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::CSG;
    use approx::assert_relative_eq;

    /// Every polygon plane must face away from the origin for these convex solids.
    fn assert_outward(mesh: &Mesh<()>) {
        for poly in &mesh.polygons {
            let centroid = poly
                .vertices
                .iter()
                .fold(Vector3::zeros(), |acc, v| acc + v.pos.coords)
                / poly.vertices.len() as Real;
            assert!(poly.plane.normal.dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn cube_is_centred_and_closed() {
        let cube: Mesh<()> = Mesh::cube(1.0, None);
        assert_eq!(cube.polygons.len(), 6);
        let bb = cube.bounding_box();
        assert_relative_eq!(bb.mins, Point3::new(-0.5, -0.5, -0.5));
        assert_relative_eq!(bb.maxs, Point3::new(0.5, 0.5, 0.5));
        assert_outward(&cube);
        assert!(cube.is_manifold());
    }

    #[test]
    fn sphere_faces_outward() {
        let sphere: Mesh<()> = Mesh::sphere(0.5, 32, 16, None);
        assert_eq!(sphere.polygons.len(), 32 * 16);
        assert_outward(&sphere);
        for v in sphere.vertices() {
            assert_relative_eq!(v.pos.coords.norm(), 0.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn cylinder_spans_unit_height_along_y() {
        let cyl: Mesh<()> = Mesh::cylinder(0.5, 1.0, 32, None);
        assert_eq!(cyl.polygons.len(), 32 * 3);
        assert_outward(&cyl);
        let bb = cyl.bounding_box();
        assert_relative_eq!(bb.mins.y, -0.5);
        assert_relative_eq!(bb.maxs.y, 0.5);
        assert!(cyl.is_manifold());
    }
}
