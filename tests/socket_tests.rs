mod support;

use limbshell::errors::GeometryError;
use limbshell::indexed_mesh::IndexedMesh;
use limbshell::pipeline::generate_limb_mesh;
use limbshell::primitive::{BooleanOp, Primitive, PrimitiveId, PrimitiveKind};
use limbshell::socket::{SocketConfig, SocketShellBuilder, SocketWarning, offset_points};
use nalgebra::{Point3, Vector3};
use support::{quick_settings, reference_slices};

fn limb() -> IndexedMesh {
    generate_limb_mesh(&reference_slices(), &quick_settings())
}

#[test]
fn offset_expands_monotonically() {
    let limb = limb();
    let centroid = limb.centroid().expect("vertices");
    let thickness = 0.5;
    for (inner, outer) in limb.vertices.iter().zip(offset_points(&limb.vertices, thickness)) {
        let grown = (outer - centroid).norm() - (inner - centroid).norm();
        assert!(grown >= thickness - 1e-9, "grew by {grown}");
    }
}

#[test]
fn top_cut_bounds_every_vertex() {
    let limb = limb();
    let top_y = limb.max_y().expect("vertices");
    let config = SocketConfig::default();
    let output = SocketShellBuilder::new(config).build(&limb, &[]).expect("socket");
    assert!(!output.mesh.is_empty());
    for v in &output.mesh.vertices {
        assert!(v.y <= top_y - config.top_cut_epsilon + 1e-4, "vertex at {}", v.y);
    }
}

#[test]
fn socket_is_open_at_the_top() {
    let output = SocketShellBuilder::new(SocketConfig::default())
        .build(&limb(), &[])
        .expect("socket");
    assert!(output.mesh.boundary_edge_count() > 0);
}

#[test]
fn outer_wall_encloses_the_limb() {
    let limb = limb();
    let output = SocketShellBuilder::new(SocketConfig::default().with_thickness(0.75))
        .build(&limb, &[])
        .expect("socket");
    let inner = limb.bounding_box().expect("vertices");
    let outer = output.mesh.bounding_box().expect("vertices");
    assert!(outer.mins.x < inner.mins.x);
    assert!(outer.maxs.z > inner.maxs.z);
    assert!(outer.mins.y < inner.mins.y);
}

#[test]
fn too_small_limb_is_reported() {
    let triangle = IndexedMesh::new(
        vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
        vec![[0, 1, 2]],
        None,
    );
    let err = SocketShellBuilder::new(SocketConfig::default())
        .build(&triangle, &[])
        .expect_err("three vertices");
    assert_eq!(err, GeometryError::InsufficientGeometry { required: 4, found: 3 });
}

#[test]
fn primitives_apply_in_order_and_failures_are_skipped() {
    let limb = limb();
    let bb = limb.bounding_box().expect("vertices");
    let side = Vector3::new(bb.maxs.x + 3.0, 0.5 * (bb.mins.y + bb.maxs.y), 0.0);

    let boss = Primitive::new(PrimitiveId::from("boss"), PrimitiveKind::Cube).with_position(side);
    let broken = Primitive::new(PrimitiveId::from("broken"), PrimitiveKind::Sphere)
        .with_scale(Vector3::zeros())
        .with_operation(BooleanOp::Subtract);
    let drill = Primitive::new(PrimitiveId::from("drill"), PrimitiveKind::Cylinder)
        .with_position(side)
        .with_scale(Vector3::new(2.0, 2.0, 2.0))
        .with_operation(BooleanOp::Subtract);

    let builder = SocketShellBuilder::new(SocketConfig::default().with_primitive_segments(12));

    let added = builder.build(&limb, &[boss.clone()]).expect("socket");
    assert!(added.mesh.bounding_box().expect("vertices").maxs.x >= side.x + 0.5 - 1e-9);

    // the drill removes the boss it follows; the broken sphere in between is skipped
    let drilled = builder.build(&limb, &[boss, broken, drill]).expect("socket");
    assert_eq!(drilled.warnings.len(), 1);
    assert!(matches!(
        &drilled.warnings[0],
        SocketWarning::PrimitiveSkipped { id, operation: BooleanOp::Subtract, .. } if id.as_str() == "broken"
    ));
    assert!(drilled.mesh.bounding_box().expect("vertices").maxs.x < side.x - 0.5);
}
