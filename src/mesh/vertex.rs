//! Struct and functions for working with `Vertex`s from which `Polygon`s are composed.

use crate::float_types::Real;
use nalgebra::{Matrix4, Point3, Vector3};

/// A vertex of a polygon, holding position and normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub pos: Point3<Real>,
    pub normal: Vector3<Real>,
}

impl Vertex {
    /// Create a new [`Vertex`].
    ///
    /// * `pos`    – the position in model space
    /// * `normal` – (optionally non‑unit) normal; it is copied verbatim,
    ///   BSP classification only ever looks at the owning polygon's plane.
    pub const fn new(pos: Point3<Real>, normal: Vector3<Real>) -> Self {
        Vertex { pos, normal }
    }

    /// Flip vertex normal
    pub fn flip(&mut self) {
        self.normal = -self.normal;
    }

    /// Linear interpolation between `self` (`t = 0`) and `other` (`t = 1`).
    ///
    /// Normals are linearly interpolated as well.
    pub fn interpolate(&self, other: &Vertex, t: Real) -> Vertex {
        let new_pos = self.pos + (other.pos - self.pos) * t;
        let new_normal = self.normal + (other.normal - self.normal) * t;
        Vertex::new(new_pos, new_normal)
    }

    /// Apply a homogeneous transform to the position and the inverse-transpose
    /// `normal_matrix` to the normal.
    pub fn transformed(&self, matrix: &Matrix4<Real>, normal_matrix: &Matrix4<Real>) -> Vertex {
        let pos = matrix.transform_point(&self.pos);
        let normal = normal_matrix.transform_vector(&self.normal);
        let normal = normal.try_normalize(Real::EPSILON).unwrap_or(normal);
        Vertex::new(pos, normal)
    }

    /// True when both position and normal contain only finite components.
    pub fn is_finite(&self) -> bool {
        self.pos.coords.iter().all(|c| c.is_finite()) && self.normal.iter().all(|c| c.is_finite())
    }
}
