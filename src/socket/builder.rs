//! Limb mesh → open, thickness-walled socket shell.

use crate::errors::{GeometryError, GeometryResult};
use crate::float_types::{Real, tolerance};
use crate::indexed_mesh::IndexedMesh;
use crate::mesh::Mesh;
use crate::mesh::convex_hull::{MIN_HULL_POINTS, hull_triangles};
use crate::primitive::{BooleanOp, Primitive, build_primitive};
use crate::socket::{BooleanEngine, BspBooleanEngine, SocketConfig, SocketOutput, SocketWarning};
use nalgebra::{Point3, Vector3};
use tracing::{debug, info, warn};

/// Minimum height of the opening cut box.
const MIN_CUT_HEIGHT: Real = 10.0;

/// Move every point `thickness` further from the centroid of the set.
///
/// A point sitting on the centroid is pushed along +Y.
pub fn offset_points(points: &[Point3<Real>], thickness: Real) -> Vec<Point3<Real>> {
    if points.is_empty() {
        return Vec::new();
    }
    let centroid = Point3::from(
        points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / points.len() as Real,
    );
    points
        .iter()
        .map(|p| {
            let dir = (p - centroid)
                .try_normalize(Real::EPSILON)
                .unwrap_or_else(Vector3::y);
            p + dir * thickness
        })
        .collect()
}

/// Builds socket shells, delegating every boolean to a [`BooleanEngine`].
///
/// The inner surface is the limb (or its convex hull); the outer surface is
/// the convex hull of the limb vertices pushed out by the wall thickness.
#[derive(Debug, Clone, Default)]
pub struct SocketShellBuilder<E: BooleanEngine = BspBooleanEngine> {
    pub config: SocketConfig,
    engine: E,
}

impl SocketShellBuilder<BspBooleanEngine> {
    pub const fn new(config: SocketConfig) -> Self {
        SocketShellBuilder {
            config,
            engine: BspBooleanEngine,
        }
    }
}

impl<E: BooleanEngine> SocketShellBuilder<E> {
    pub const fn with_engine(config: SocketConfig, engine: E) -> Self {
        SocketShellBuilder { config, engine }
    }

    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Build the socket for `limb`, then apply `primitives` in order.
    ///
    /// Fails when the limb is malformed or has fewer than four vertices, when
    /// a hull cannot be formed, or when hollowing the outer surface fails. A failed top cut or
    /// primitive is skipped and reported in [`SocketOutput::warnings`].
    pub fn build(&self, limb: &IndexedMesh, primitives: &[Primitive]) -> GeometryResult<SocketOutput> {
        self.config.validate()?;
        limb.validate()?;

        let points = &limb.vertices;
        if points.len() < MIN_HULL_POINTS {
            return Err(GeometryError::InsufficientGeometry {
                required: MIN_HULL_POINTS,
                found: points.len(),
            });
        }

        let inner = if self.config.use_convex_hull {
            limb.convex_hull()?
        } else {
            limb.clone()
        };
        let outer = IndexedMesh::from_triangles(hull_triangles(&offset_points(
            points,
            self.config.thickness,
        ))?);
        debug!(
            limb = points.len(),
            inner = inner.triangle_count(),
            outer = outer.triangle_count(),
            "socket surfaces"
        );

        let mut shell = self.engine.subtract(&outer, &inner)?;
        let mut warnings = Vec::new();

        if let Some(top_y) = limb.max_y() {
            match self.cut_top(&shell, top_y) {
                Ok(cut) => shell = cut,
                Err(err) => {
                    warn!(error = %err, "top cut failed, socket stays closed");
                    warnings.push(SocketWarning::TopCutSkipped {
                        reason: err.to_string(),
                    });
                },
            }
        }

        for primitive in primitives {
            let tool = build_primitive(primitive, self.config.primitive_segments);
            match self.engine.apply(primitive.operation, &shell, &tool) {
                Ok(next) => shell = next,
                Err(err) => {
                    warn!(
                        primitive = %primitive.id,
                        operation = %primitive.operation,
                        error = %err,
                        "skipping primitive"
                    );
                    warnings.push(SocketWarning::PrimitiveSkipped {
                        id: primitive.id.clone(),
                        operation: primitive.operation,
                        reason: err.to_string(),
                    });
                },
            }
        }

        let mesh = if shell.is_empty() {
            shell
        } else {
            shell.weld(tolerance()).with_smooth_normals()
        };
        info!(
            triangles = mesh.triangle_count(),
            primitives = primitives.len(),
            warnings = warnings.len(),
            "socket shell generated"
        );
        Ok(SocketOutput { mesh, warnings })
    }

    /// Remove everything above `top_y - top_cut_epsilon`.
    fn cut_top(&self, shell: &IndexedMesh, top_y: Real) -> GeometryResult<IndexedMesh> {
        let bounds = shell
            .bounding_box()
            .ok_or_else(|| GeometryError::boolean(BooleanOp::Subtract, "shell has no vertices"))?;
        let tool = IndexedMesh::from_mesh(&cut_box(bounds.mins, bounds.maxs, top_y - self.config.top_cut_epsilon));
        self.engine.subtract(shell, &tool)
    }
}

/// Box whose lower face sits at `floor`, covering twice the shell's
/// footprint and at least [`MIN_CUT_HEIGHT`] upward.
fn cut_box(mins: Point3<Real>, maxs: Point3<Real>, floor: Real) -> Mesh<()> {
    let center = nalgebra::center(&mins, &maxs);
    let extent = maxs - mins;
    let half_x = extent.x.max(1.0);
    let half_z = extent.z.max(1.0);
    let height = extent.y.max(MIN_CUT_HEIGHT);
    Mesh::cuboid(
        Point3::new(center.x - half_x, floor, center.z - half_z),
        Point3::new(center.x + half_x, floor + height, center.z + half_z),
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::{PrimitiveId, PrimitiveKind};
    use approx::assert_relative_eq;

    fn block_limb() -> IndexedMesh {
        let prim = Primitive::new(PrimitiveId::from("limb"), PrimitiveKind::Cube)
            .with_scale(Vector3::new(4.0, 6.0, 4.0))
            .with_position(Vector3::new(0.0, 3.0, 0.0));
        build_primitive(&prim, 8)
    }

    struct RefusingEngine;

    impl BooleanEngine for RefusingEngine {
        fn apply(&self, op: BooleanOp, _: &IndexedMesh, _: &IndexedMesh) -> GeometryResult<IndexedMesh> {
            Err(GeometryError::boolean(op, "refused"))
        }
    }

    #[test]
    fn too_few_vertices_is_insufficient() {
        let err = SocketShellBuilder::new(SocketConfig::default())
            .build(&IndexedMesh::empty(), &[])
            .expect_err("sentinel limb");
        assert_eq!(err, GeometryError::InsufficientGeometry { required: 4, found: 1 });
    }

    #[test]
    fn offset_moves_points_away_by_thickness() {
        let points = block_limb().vertices;
        let centroid = Point3::new(0.0, 3.0, 0.0);
        for (p, q) in points.iter().zip(offset_points(&points, 0.5)) {
            assert_relative_eq!((q - centroid).norm(), (p - centroid).norm() + 0.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn point_on_centroid_moves_up() {
        let moved = offset_points(&[Point3::origin()], 2.0);
        assert_relative_eq!(moved[0], Point3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn shell_is_open_below_the_limb_top() {
        let output = SocketShellBuilder::new(SocketConfig::default())
            .build(&block_limb(), &[])
            .expect("socket");
        assert!(output.warnings.is_empty());
        assert!(!output.mesh.is_empty());
        let top = output.mesh.max_y().expect("vertices");
        assert!(top <= 6.0 - 0.05 + 1e-6);
        // the outer wall reaches below the limb
        let bb = output.mesh.bounding_box().expect("vertices");
        assert!(bb.mins.y < 0.0);
        assert!(output.mesh.normals.is_some());
    }

    #[test]
    fn failing_primitive_is_skipped_with_warning() {
        let limb = block_limb();
        let builder = SocketShellBuilder::new(SocketConfig::default());
        let plain = builder.build(&limb, &[]).expect("socket");

        let degenerate = Primitive::new(PrimitiveId::from("flat"), PrimitiveKind::Cube)
            .with_scale(Vector3::zeros())
            .with_operation(BooleanOp::Subtract);
        let output = builder.build(&limb, &[degenerate]).expect("socket");
        assert_eq!(output.warnings.len(), 1);
        assert!(matches!(
            &output.warnings[0],
            SocketWarning::PrimitiveSkipped { id, .. } if id.as_str() == "flat"
        ));
        assert_eq!(output.mesh, plain.mesh);
    }

    #[test]
    fn union_primitive_extends_the_shell() {
        let boss = Primitive::new(PrimitiveId::from("boss"), PrimitiveKind::Sphere)
            .with_position(Vector3::new(5.0, 2.0, 0.0));
        let output = SocketShellBuilder::new(SocketConfig::default().with_primitive_segments(12))
            .build(&block_limb(), &[boss])
            .expect("socket");
        assert!(output.warnings.is_empty());
        let bb = output.mesh.bounding_box().expect("vertices");
        assert!(bb.maxs.x >= 5.4);
    }

    #[test]
    fn hollowing_failure_is_fatal() {
        let err = SocketShellBuilder::with_engine(SocketConfig::default(), RefusingEngine)
            .build(&block_limb(), &[])
            .expect_err("engine refuses");
        assert!(matches!(err, GeometryError::BooleanOperationFailure { .. }));
    }

    #[test]
    fn limb_mesh_can_be_the_inner_surface() {
        let output = SocketShellBuilder::new(SocketConfig::default().with_convex_hull(false))
            .build(&block_limb(), &[])
            .expect("socket");
        assert!(!output.mesh.is_empty());
    }

    #[test]
    fn repeated_builds_are_identical() {
        let limb = block_limb();
        let builder = SocketShellBuilder::new(SocketConfig::default());
        let first = builder.build(&limb, &[]).expect("socket");
        let second = builder.build(&limb, &[]).expect("socket");
        assert_eq!(first, second);
    }

    #[test]
    fn dangling_limb_index_is_rejected() {
        let mut limb = block_limb();
        limb.indices.push([0, 1, 99]);
        let err = SocketShellBuilder::new(SocketConfig::default().with_convex_hull(false))
            .build(&limb, &[])
            .expect_err("malformed limb");
        assert!(matches!(err, GeometryError::InvalidMesh(_)));
    }

    #[test]
    fn union_after_emptying_intersection_keeps_the_primitive() {
        let far = Primitive::new(PrimitiveId::from("far"), PrimitiveKind::Cube)
            .with_position(Vector3::new(50.0, 0.0, 0.0))
            .with_operation(BooleanOp::Intersect);
        let add = Primitive::new(PrimitiveId::from("add"), PrimitiveKind::Cube)
            .with_position(Vector3::new(20.0, 0.0, 0.0));
        let output = SocketShellBuilder::new(SocketConfig::default())
            .build(&block_limb(), &[far, add])
            .expect("socket");
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
        assert_relative_eq!(output.mesh.signed_volume(), 1.0, epsilon = 1e-9);
        let bb = output.mesh.bounding_box().expect("vertices");
        assert_relative_eq!(bb.mins.x, 19.5, epsilon = 1e-9);
    }
}
