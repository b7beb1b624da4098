//! 3D convex hulls via the [`chull`](https://crates.io/crates/chull) quickhull.

use crate::errors::{GeometryError, GeometryResult};
use crate::float_types::{Real, tolerance};
use crate::mesh::Mesh;
use chull::ConvexHullWrapper;
use hashbrown::HashSet;
use nalgebra::{Point3, Vector3};
use std::cmp::Ordering;
use std::fmt::Debug;

/// Minimum number of unique points that can bound a volume.
pub const MIN_HULL_POINTS: usize = 4;

/// Drop points that coincide within [`tolerance`], keeping the first occurrence.
pub fn dedup_points(points: &[Point3<Real>]) -> Vec<Point3<Real>> {
    let tol = tolerance();
    let mut seen = HashSet::with_capacity(points.len());
    points
        .iter()
        .filter(|p| {
            seen.insert((
                (p.x / tol).round() as i64,
                (p.y / tol).round() as i64,
                (p.z / tol).round() as i64,
            ))
        })
        .copied()
        .collect()
}

/// True when the points are not all on one plane.
fn spans_volume(points: &[Point3<Real>]) -> bool {
    let Some(&origin) = points.first() else {
        return false;
    };
    let farthest = |metric: &dyn Fn(&Point3<Real>) -> Real| {
        points
            .iter()
            .map(|p| (metric(p), *p))
            .fold((0.0, origin), |best, cur| if cur.0 > best.0 { cur } else { best })
    };

    let (d1, a) = farthest(&|p| (p - origin).norm());
    if d1 <= tolerance() {
        return false;
    }
    let axis = (a - origin) / d1;
    let (d2, b) = farthest(&|p| (p - origin).cross(&axis).norm());
    if d2 <= tolerance() {
        return false;
    }
    let normal = (a - origin).cross(&(b - origin)).normalize();
    let (d3, _) = farthest(&|p| (p - origin).dot(&normal).abs());
    d3 > tolerance() * d1.max(1.0)
}

/// Convex hull of a point cloud as outward-facing triangles.
///
/// Fails with [`GeometryError::InsufficientGeometry`] for fewer than four
/// unique points and with [`GeometryError::DegenerateHull`] when the points
/// do not span a volume.
pub fn hull_triangles(points: &[Point3<Real>]) -> GeometryResult<Vec<[Point3<Real>; 3]>> {
    let unique = dedup_points(points);
    if unique.len() < MIN_HULL_POINTS {
        return Err(GeometryError::InsufficientGeometry {
            required: MIN_HULL_POINTS,
            found: unique.len(),
        });
    }

    if !spans_volume(&unique) {
        return Err(GeometryError::DegenerateHull(
            "points are collinear or coplanar".into(),
        ));
    }

    let points_for_hull: Vec<Vec<Real>> = unique.iter().map(|p| vec![p.x, p.y, p.z]).collect();
    let hull = ConvexHullWrapper::try_new(&points_for_hull, None)
        .map_err(|e| GeometryError::DegenerateHull(format!("{e:?}")))?;
    let (verts, indices) = hull.vertices_indices();

    let hull_points: Vec<Point3<Real>> = verts
        .iter()
        .filter(|v| v.len() >= 3)
        .map(|v| Point3::new(v[0], v[1], v[2]))
        .collect();
    if hull_points.len() < MIN_HULL_POINTS || hull_points.len() != verts.len() {
        return Err(GeometryError::DegenerateHull(format!(
            "hull kept {} of {} points",
            hull_points.len(),
            unique.len()
        )));
    }

    // The vertex centroid is strictly inside a non-degenerate hull.
    let centroid = Point3::from(
        hull_points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / hull_points.len() as Real,
    );

    let mut triangles = Vec::with_capacity(indices.len() / 3);
    for tri in indices.chunks_exact(3) {
        let (Some(&a), Some(&b), Some(&c)) = (
            hull_points.get(tri[0]),
            hull_points.get(tri[1]),
            hull_points.get(tri[2]),
        ) else {
            return Err(GeometryError::DegenerateHull("hull index out of range".into()));
        };

        let normal = (b - a).cross(&(c - a));
        if normal.norm_squared() <= Real::EPSILON * Real::EPSILON {
            continue;
        }
        let face_center = Point3::from((a.coords + b.coords + c.coords) / 3.0);
        if normal.dot(&(face_center - centroid)) >= 0.0 {
            triangles.push([a, b, c]);
        } else {
            triangles.push([a, c, b]);
        }
    }

    let triangles = canonical_faces(&triangles);
    if triangles.len() < MIN_HULL_POINTS {
        return Err(GeometryError::DegenerateHull(format!(
            "hull has only {} faces",
            triangles.len()
        )));
    }
    Ok(triangles)
}

fn lex_cmp(a: &Point3<Real>, b: &Point3<Real>) -> Ordering {
    a.x.total_cmp(&b.x)
        .then(a.y.total_cmp(&b.y))
        .then(a.z.total_cmp(&b.z))
}

/// Re-triangulate hull faces into a form that only depends on the geometry.
///
/// quickhull visits facets in hash order, so coplanar regions come back
/// split along arbitrary diagonals and in arbitrary order. Triangles sharing
/// a plane are merged into one convex polygon (extreme points only), fanned
/// from its lexicographically smallest corner, and the result is sorted.
fn canonical_faces(triangles: &[[Point3<Real>; 3]]) -> Vec<[Point3<Real>; 3]> {
    let tol = tolerance();
    let mut planes: Vec<(Vector3<Real>, Real, Vec<Point3<Real>>)> = Vec::new();
    for &[a, b, c] in triangles {
        let normal = (b - a).cross(&(c - a)).normalize();
        let offset = normal.dot(&a.coords);
        match planes
            .iter_mut()
            .find(|(n, d, _)| n.dot(&normal) > 1.0 - 1e-9 && (d - offset).abs() <= tol)
        {
            Some((_, _, points)) => points.extend([a, b, c]),
            None => planes.push((normal, offset, vec![a, b, c])),
        }
    }

    let mut faces = Vec::with_capacity(triangles.len());
    for (normal, _, points) in &planes {
        let ring = face_polygon(normal, points);
        if ring.len() < 3 {
            continue;
        }
        for i in 1..ring.len() - 1 {
            faces.push([ring[0], ring[i], ring[i + 1]]);
        }
    }
    faces.sort_by(|x, y| {
        lex_cmp(&x[0], &y[0])
            .then_with(|| lex_cmp(&x[1], &y[1]))
            .then_with(|| lex_cmp(&x[2], &y[2]))
    });
    faces
}

/// Counter-clockwise (seen from `normal`) convex outline of coplanar points,
/// starting at the lexicographically smallest one.
fn face_polygon(normal: &Vector3<Real>, points: &[Point3<Real>]) -> Vec<Point3<Real>> {
    let axis = if normal.x.abs() <= normal.y.abs() && normal.x.abs() <= normal.z.abs() {
        Vector3::x()
    } else if normal.y.abs() <= normal.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let u = normal.cross(&axis).normalize();
    let v = normal.cross(&u);

    let mut projected: Vec<(Real, Real, Point3<Real>)> = points
        .iter()
        .map(|p| (u.dot(&p.coords), v.dot(&p.coords), *p))
        .collect();
    projected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    // monotone chain, dropping collinear and repeated points
    let eps = tolerance() * tolerance();
    let turn = |o: &(Real, Real, Point3<Real>), a: &(Real, Real, Point3<Real>), b: &(Real, Real, Point3<Real>)| {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    };
    let mut lower: Vec<(Real, Real, Point3<Real>)> = Vec::new();
    for p in &projected {
        while lower.len() >= 2 && turn(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= eps {
            lower.pop();
        }
        lower.push(*p);
    }
    let mut upper: Vec<(Real, Real, Point3<Real>)> = Vec::new();
    for p in projected.iter().rev() {
        while upper.len() >= 2 && turn(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= eps {
            upper.pop();
        }
        upper.push(*p);
    }
    lower.pop();
    upper.pop();
    let mut ring: Vec<Point3<Real>> = lower.into_iter().chain(upper).map(|(_, _, p)| p).collect();

    if let Some(start) = ring
        .iter()
        .enumerate()
        .min_by(|a, b| lex_cmp(a.1, b.1))
        .map(|(i, _)| i)
    {
        ring.rotate_left(start);
    }
    ring
}

impl<S: Clone + Debug + Send + Sync> Mesh<S> {
    /// Compute the convex hull of all vertices in this Mesh.
    pub fn convex_hull(&self) -> GeometryResult<Mesh<S>> {
        let points: Vec<Point3<Real>> = self
            .polygons
            .iter()
            .flat_map(|poly| poly.vertices.iter().map(|v| v.pos))
            .collect();

        let triangles = hull_triangles(&points)?;
        Ok(Mesh::from_triangles(triangles, self.metadata.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::CSG;
    use approx::assert_relative_eq;

    #[test]
    fn hull_of_cube_corners_is_outward() {
        let cube: Mesh<()> = Mesh::cube(2.0, None);
        let hull = cube.convex_hull().expect("cube spans a volume");
        assert!(hull.polygons.len() >= 12);
        for poly in &hull.polygons {
            let c = poly.vertices[0].pos.coords;
            assert!(poly.plane.normal.dot(&c) > 0.0);
        }
        let bb = hull.bounding_box();
        assert_relative_eq!(bb.maxs, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn hull_ignores_interior_points() {
        let mut points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        points.push(Point3::new(0.1, 0.1, 0.1));
        let tris = hull_triangles(&points).expect("tetrahedron");
        assert_eq!(tris.len(), 4);
        assert!(tris.iter().flatten().all(|p| *p != Point3::new(0.1, 0.1, 0.1)));
    }

    #[test]
    fn too_few_unique_points_is_insufficient() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let err = hull_triangles(&[p, p, p, p, Point3::origin()]).unwrap_err();
        assert_eq!(err, GeometryError::InsufficientGeometry { required: 4, found: 2 });
    }

    #[test]
    fn coplanar_points_are_degenerate() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        assert!(matches!(
            hull_triangles(&points),
            Err(GeometryError::DegenerateHull(_))
        ));
    }

    #[test]
    fn hull_is_independent_of_point_order() {
        let mut points: Vec<Point3<Real>> = Vec::new();
        for &x in &[-1.0, 1.0] {
            for &y in &[-1.0, 1.0] {
                for &z in &[-1.0, 1.0] {
                    points.push(Point3::new(x, y, z));
                }
            }
        }
        // face centres are coplanar with the corners and must not show up
        points.push(Point3::new(1.0, 0.0, 0.0));
        points.push(Point3::new(0.0, -1.0, 0.0));
        points.push(Point3::new(0.3, 0.2, -0.1));

        let first = hull_triangles(&points).expect("box");
        let again = hull_triangles(&points).expect("box");
        let mut reversed = points.clone();
        reversed.reverse();
        let shuffled = hull_triangles(&reversed).expect("box");

        assert_eq!(first, again);
        assert_eq!(first, shuffled);
        assert_eq!(first.len(), 12);
        assert!(first.iter().flatten().all(|p| p.x.abs() == 1.0 && p.y.abs() == 1.0 && p.z.abs() == 1.0));
    }
}
