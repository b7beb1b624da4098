//! Mesh booleans as an injectable capability.

use crate::errors::{GeometryError, GeometryResult};
use crate::indexed_mesh::IndexedMesh;
use crate::primitive::BooleanOp;
use crate::traits::CSG;
use tracing::debug;

/// Boolean combination of two closed triangle meshes.
///
/// Implementations report numerical trouble as
/// [`GeometryError::BooleanOperationFailure`]; the socket builder decides
/// whether that is fatal.
pub trait BooleanEngine {
    fn apply(&self, op: BooleanOp, a: &IndexedMesh, b: &IndexedMesh) -> GeometryResult<IndexedMesh>;

    fn union(&self, a: &IndexedMesh, b: &IndexedMesh) -> GeometryResult<IndexedMesh> {
        self.apply(BooleanOp::Union, a, b)
    }

    fn subtract(&self, a: &IndexedMesh, b: &IndexedMesh) -> GeometryResult<IndexedMesh> {
        self.apply(BooleanOp::Subtract, a, b)
    }

    fn intersect(&self, a: &IndexedMesh, b: &IndexedMesh) -> GeometryResult<IndexedMesh> {
        self.apply(BooleanOp::Intersect, a, b)
    }
}

impl<E: BooleanEngine + ?Sized> BooleanEngine for &E {
    fn apply(&self, op: BooleanOp, a: &IndexedMesh, b: &IndexedMesh) -> GeometryResult<IndexedMesh> {
        (**self).apply(op, a, b)
    }
}

/// Booleans on BSP trees of the triangles (see [`crate::mesh::Mesh`]).
///
/// An empty or malformed right operand is a failure. An empty left operand
/// is not: an earlier intersection may have emptied the running shell, and
/// the result is then just the right operand for a union and empty
/// otherwise. Empty results are likewise legitimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BspBooleanEngine;

impl BooleanEngine for BspBooleanEngine {
    fn apply(&self, op: BooleanOp, a: &IndexedMesh, b: &IndexedMesh) -> GeometryResult<IndexedMesh> {
        for operand in [a, b] {
            operand
                .validate()
                .map_err(|err| GeometryError::boolean(op, err.to_string()))?;
        }
        let lhs = a.to_mesh::<()>(None);
        let rhs = b.to_mesh::<()>(None);
        if rhs.is_empty() {
            return Err(GeometryError::boolean(op, "right operand has no faces"));
        }
        if !(lhs.is_finite() && rhs.is_finite()) {
            return Err(GeometryError::boolean(op, "operand has non-finite vertices"));
        }
        if lhs.is_empty() {
            debug!(%op, "left operand is empty");
            return Ok(match op {
                BooleanOp::Union => b.clone(),
                BooleanOp::Subtract | BooleanOp::Intersect => IndexedMesh::empty(),
            });
        }

        let result = match op {
            BooleanOp::Union => lhs.union(&rhs),
            BooleanOp::Subtract => lhs.difference(&rhs),
            BooleanOp::Intersect => lhs.intersection(&rhs),
        };
        if !result.is_finite() {
            return Err(GeometryError::boolean(op, "result has non-finite vertices"));
        }

        let mesh = IndexedMesh::from_mesh(&result);
        debug!(
            %op,
            lhs = a.triangle_count(),
            rhs = b.triangle_count(),
            result = mesh.triangle_count(),
            "bsp boolean"
        );
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float_types::Real;
    use crate::primitive::{Primitive, PrimitiveId, PrimitiveKind, build_primitive};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn cube_at(x: Real) -> IndexedMesh {
        let prim = Primitive::new(PrimitiveId::from("c"), PrimitiveKind::Cube)
            .with_scale(Vector3::repeat(2.0))
            .with_position(Vector3::new(x, 0.0, 0.0));
        build_primitive(&prim, 8)
    }

    #[test]
    fn subtract_overlapping_cubes() {
        let result = BspBooleanEngine.subtract(&cube_at(0.0), &cube_at(1.0)).expect("boolean");
        assert_relative_eq!(result.signed_volume(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn union_and_intersect_volumes() {
        let union = BspBooleanEngine.union(&cube_at(0.0), &cube_at(1.0)).expect("boolean");
        assert_relative_eq!(union.signed_volume(), 12.0, epsilon = 1e-9);
        let inter = BspBooleanEngine.intersect(&cube_at(0.0), &cube_at(1.0)).expect("boolean");
        assert_relative_eq!(inter.signed_volume(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn disjoint_intersection_is_empty_not_an_error() {
        let inter = BspBooleanEngine.intersect(&cube_at(0.0), &cube_at(10.0)).expect("boolean");
        assert!(inter.is_empty());
    }

    #[test]
    fn empty_operand_fails() {
        let err = BspBooleanEngine
            .union(&cube_at(0.0), &IndexedMesh::empty())
            .expect_err("empty operand");
        assert!(matches!(
            err,
            GeometryError::BooleanOperationFailure { operation: BooleanOp::Union, .. }
        ));
    }

    #[test]
    fn empty_left_operand_is_the_identity() {
        let empty = IndexedMesh::empty();
        let union = BspBooleanEngine.union(&empty, &cube_at(3.0)).expect("boolean");
        assert_eq!(union, cube_at(3.0));
        assert!(BspBooleanEngine.subtract(&empty, &cube_at(3.0)).expect("boolean").is_empty());
        assert!(BspBooleanEngine.intersect(&empty, &cube_at(3.0)).expect("boolean").is_empty());
    }

    #[test]
    fn dangling_index_fails_instead_of_panicking() {
        let mut broken = cube_at(0.0);
        broken.indices.push([0, 1, 99]);
        let err = BspBooleanEngine.union(&broken, &cube_at(1.0)).expect_err("dangling");
        assert!(matches!(err, GeometryError::BooleanOperationFailure { .. }));
    }
}
