//! User-placed canonical shapes combined with the socket shell.

use crate::float_types::Real;
use crate::indexed_mesh::IndexedMesh;
use crate::mesh::Mesh;
use crate::traits::CSG;
use core::convert::Infallible;
use core::fmt;
use core::str::FromStr;
use nalgebra::Vector3;
use tracing::warn;

/// Segment count of the canonical sphere and cylinder.
pub const DEFAULT_PRIMITIVE_SEGMENTS: usize = 32;

/// Opaque primitive identifier, unique within a model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(pub String);

impl PrimitiveId {
    pub fn new(id: impl Into<String>) -> Self {
        PrimitiveId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrimitiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrimitiveId {
    fn from(id: &str) -> Self {
        PrimitiveId::new(id)
    }
}

/// Canonical shape of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveKind {
    Sphere,
    #[default]
    Cube,
    Cylinder,
}

impl PrimitiveKind {
    /// Parse a shape name, case-insensitively. Unknown names fall back to a cube.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "sphere" => PrimitiveKind::Sphere,
            "cube" | "box" => PrimitiveKind::Cube,
            "cylinder" => PrimitiveKind::Cylinder,
            other => {
                warn!(kind = other, "unknown primitive type, using a cube");
                PrimitiveKind::Cube
            },
        }
    }
}

impl FromStr for PrimitiveKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PrimitiveKind::parse(s))
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrimitiveKind::Sphere => "sphere",
            PrimitiveKind::Cube => "cube",
            PrimitiveKind::Cylinder => "cylinder",
        })
    }
}

/// How a primitive is combined with the running shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BooleanOp {
    #[default]
    Union,
    Subtract,
    Intersect,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BooleanOp::Union => "union",
            BooleanOp::Subtract => "subtract",
            BooleanOp::Intersect => "intersect",
        })
    }
}

/// A placed primitive: canonical shape, translation, per-axis scale and the
/// boolean operation it applies.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub id: PrimitiveId,
    pub kind: PrimitiveKind,
    pub position: Vector3<Real>,
    pub scale: Vector3<Real>,
    pub operation: BooleanOp,
}

impl Primitive {
    /// Unit primitive at the origin.
    pub fn new(id: PrimitiveId, kind: PrimitiveKind) -> Self {
        Primitive {
            id,
            kind,
            position: Vector3::zeros(),
            scale: Vector3::repeat(1.0),
            operation: BooleanOp::default(),
        }
    }

    pub fn with_position(mut self, position: Vector3<Real>) -> Self {
        self.position = position;
        self
    }

    pub fn with_scale(mut self, scale: Vector3<Real>) -> Self {
        self.scale = scale;
        self
    }

    pub const fn with_operation(mut self, operation: BooleanOp) -> Self {
        self.operation = operation;
        self
    }
}

/// Partial update of a primitive; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitivePatch {
    pub kind: Option<PrimitiveKind>,
    pub position: Option<Vector3<Real>>,
    pub scale: Option<Vector3<Real>>,
    pub operation: Option<BooleanOp>,
}

impl PrimitivePatch {
    pub fn kind(mut self, kind: PrimitiveKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn position(mut self, position: Vector3<Real>) -> Self {
        self.position = Some(position);
        self
    }

    pub fn scale(mut self, scale: Vector3<Real>) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn operation(mut self, operation: BooleanOp) -> Self {
        self.operation = Some(operation);
        self
    }

    /// `primitive` with this patch applied. The id never changes.
    pub fn apply(&self, primitive: &Primitive) -> Primitive {
        Primitive {
            id: primitive.id.clone(),
            kind: self.kind.unwrap_or(primitive.kind),
            position: self.position.unwrap_or(primitive.position),
            scale: self.scale.unwrap_or(primitive.scale),
            operation: self.operation.unwrap_or(primitive.operation),
        }
    }
}

/// Canonical shape as a BSP mesh, before placement.
fn canonical_mesh(kind: PrimitiveKind, segments: usize) -> Mesh<()> {
    let segments = segments.max(3);
    match kind {
        PrimitiveKind::Sphere => Mesh::sphere(0.5, segments, (segments / 2).max(2), None),
        PrimitiveKind::Cube => Mesh::cube(1.0, None),
        PrimitiveKind::Cylinder => Mesh::cylinder(0.5, 1.0, segments, None),
    }
}

/// Build the placed primitive as a polygon mesh: canonical shape, scaled per
/// axis, then translated to `position`.
pub fn primitive_mesh(primitive: &Primitive, segments: usize) -> Mesh<()> {
    let s = primitive.scale;
    let p = primitive.position;
    canonical_mesh(primitive.kind, segments)
        .scale(s.x, s.y, s.z)
        .translate(p.x, p.y, p.z)
}

/// Build the placed primitive as an indexed mesh.
///
/// Unit sphere of radius 0.5, unit cube, or cylinder of radius 0.5 and height
/// 1 along +Y, all centred on the origin before placement. A zero scale
/// collapses the shape to the empty sentinel.
pub fn build_primitive(primitive: &Primitive, segments: usize) -> IndexedMesh {
    IndexedMesh::from_mesh(&primitive_mesh(primitive, segments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn unit(kind: PrimitiveKind) -> Primitive {
        Primitive::new(PrimitiveId::from("p1"), kind)
    }

    #[test]
    fn unknown_kind_defaults_to_cube() {
        assert_eq!(PrimitiveKind::parse("torus"), PrimitiveKind::Cube);
        assert_eq!("Sphere".parse::<PrimitiveKind>(), Ok(PrimitiveKind::Sphere));
        assert_eq!(PrimitiveKind::parse(" cylinder "), PrimitiveKind::Cylinder);
    }

    #[test]
    fn unit_cube_spans_half_extents() {
        let mesh = build_primitive(&unit(PrimitiveKind::Cube), DEFAULT_PRIMITIVE_SEGMENTS);
        let bb = mesh.bounding_box().expect("non-empty");
        assert_relative_eq!(bb.mins, Point3::new(-0.5, -0.5, -0.5));
        assert_relative_eq!(bb.maxs, Point3::new(0.5, 0.5, 0.5));
        assert!(mesh.is_closed_manifold());
        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn placement_scales_then_translates() {
        let prim = unit(PrimitiveKind::Cube)
            .with_scale(Vector3::new(2.0, 1.0, 4.0))
            .with_position(Vector3::new(10.0, 0.0, 0.0));
        let bb = build_primitive(&prim, 8).bounding_box().expect("non-empty");
        assert_relative_eq!(bb.mins, Point3::new(9.0, -0.5, -2.0));
        assert_relative_eq!(bb.maxs, Point3::new(11.0, 0.5, 2.0));
    }

    #[test]
    fn cylinder_runs_along_y() {
        let mesh = build_primitive(&unit(PrimitiveKind::Cylinder), DEFAULT_PRIMITIVE_SEGMENTS);
        let bb = mesh.bounding_box().expect("non-empty");
        assert_relative_eq!(bb.mins.y, -0.5);
        assert_relative_eq!(bb.maxs.y, 0.5);
        assert_relative_eq!(bb.maxs.x, 0.5, epsilon = 1e-9);
        assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn sphere_is_closed_and_inside_radius() {
        let mesh = build_primitive(&unit(PrimitiveKind::Sphere), DEFAULT_PRIMITIVE_SEGMENTS);
        assert!(mesh.is_closed_manifold());
        assert!(mesh.vertices.iter().all(|v| v.coords.norm() <= 0.5 + 1e-9));
        // close to 4/3 pi r^3
        assert_relative_eq!(mesh.signed_volume(), 0.5236, epsilon = 0.02);
    }

    #[test]
    fn mirrored_scale_stays_outward() {
        let prim = unit(PrimitiveKind::Cube).with_scale(Vector3::new(-2.0, 2.0, 2.0));
        let mesh = build_primitive(&prim, 8);
        assert!(mesh.is_closed_manifold());
        assert_relative_eq!(mesh.signed_volume(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_scale_collapses_to_sentinel() {
        let prim = unit(PrimitiveKind::Sphere).with_scale(Vector3::zeros());
        assert!(build_primitive(&prim, 16).is_empty());
    }

    #[test]
    fn patch_keeps_id_and_unset_fields() {
        let prim = unit(PrimitiveKind::Cube).with_operation(BooleanOp::Subtract);
        let patched = PrimitivePatch::default()
            .kind(PrimitiveKind::Sphere)
            .position(Vector3::new(1.0, 2.0, 3.0))
            .apply(&prim);
        assert_eq!(patched.id, prim.id);
        assert_eq!(patched.kind, PrimitiveKind::Sphere);
        assert_eq!(patched.operation, BooleanOp::Subtract);
        assert_eq!(patched.scale, prim.scale);
    }
}
