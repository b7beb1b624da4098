mod support;

use limbshell::errors::GeometryError;
use limbshell::primitive::{BooleanOp, PrimitiveId, PrimitiveKind, PrimitivePatch};
use limbshell::sketch::GridCell;
use limbshell::state::{LimbMode, MeshCache, ModelState};
use limbshell::pipeline::{cached_limb_mesh, cached_socket};
use nalgebra::Vector3;
use support::{grid_with, quick_settings};

fn model() -> ModelState {
    ModelState::new(quick_settings())
        .with_empty_slice(1, 0.75)
        .and_then(|s| s.with_empty_slice(2, 0.5))
        .expect("slices")
}

#[test]
fn added_primitive_gets_unique_id_and_selection() {
    let mut state = model();
    let mut ids = Vec::new();
    for kind in [PrimitiveKind::Sphere, PrimitiveKind::Cube, PrimitiveKind::Cylinder] {
        let (next, id) = state.with_new_primitive(kind);
        assert_eq!(next.selected(), Some(&id));
        assert!(!ids.contains(&id));
        ids.push(id);
        state = next;
    }
    assert_eq!(state.primitives().len(), 3);
}

#[test]
fn deleting_selected_primitive_clears_selection() {
    let (state, id) = model().with_new_primitive(PrimitiveKind::Cube);
    let state = state.without_primitive(&id).expect("delete");
    assert!(state.selected().is_none());
    assert!(state.primitives().is_empty());
}

#[test]
fn deleting_another_primitive_keeps_selection() {
    let (state, first) = model().with_new_primitive(PrimitiveKind::Cube);
    let (state, second) = state.with_new_primitive(PrimitiveKind::Sphere);
    let state = state.with_selection(Some(&first)).expect("select");
    let state = state.without_primitive(&second).expect("delete");
    assert_eq!(state.selected(), Some(&first));
}

#[test]
fn unknown_ids_are_errors() {
    let state = model();
    let ghost = PrimitiveId::from("ghost");
    assert_eq!(
        state.without_primitive(&ghost),
        Err(GeometryError::UnknownPrimitive("ghost".into()))
    );
    assert!(state.with_selection(Some(&ghost)).is_err());
    assert_eq!(state.with_cell(7, 0, 0, true), Err(GeometryError::UnknownSlice(7)));
}

#[test]
fn updates_leave_the_previous_snapshot_alone() {
    let (state, id) = model().with_new_primitive(PrimitiveKind::Cube);
    let moved = state
        .with_primitive_update(
            &id,
            &PrimitivePatch::default()
                .position(Vector3::new(0.0, 2.0, 0.0))
                .operation(BooleanOp::Intersect),
        )
        .expect("update");
    assert_eq!(state.primitive(&id).map(|p| p.position), Some(Vector3::zeros()));
    assert_eq!(moved.primitive(&id).map(|p| p.operation), Some(BooleanOp::Intersect));
    assert!(moved.revision() > state.revision());
}

#[test]
fn cache_invalidates_on_relevant_edits_only() {
    let square = [GridCell::new(9, 9), GridCell::new(9, 10), GridCell::new(10, 10), GridCell::new(10, 9)];
    let state = model()
        .with_brush_stroke(1, &square, true)
        .and_then(|s| s.with_slice_grid(2, grid_with(&[(9, 9), (9, 10), (10, 9), (10, 10)])))
        .expect("paint");

    let mut cache = MeshCache::new();
    let limb = cached_limb_mesh(&state, &mut cache).clone();
    assert!(!limb.is_empty());

    // selecting and adding primitives does not touch the limb
    let (with_prim, _) = state.with_new_primitive(PrimitiveKind::Sphere);
    assert_eq!(cached_limb_mesh(&with_prim, &mut cache), &limb);
    assert_eq!(cache.stats().hits, 1);

    // switching mode does
    let voxel = with_prim.with_limb_mode(LimbMode::Voxel);
    assert_ne!(cached_limb_mesh(&voxel, &mut cache), &limb);
    assert_eq!(cache.stats().misses, 2);
}

#[test]
fn failed_socket_keeps_the_last_good_one() {
    let square = [GridCell::new(9, 9), GridCell::new(9, 10), GridCell::new(10, 10), GridCell::new(10, 9)];
    let state = model()
        .with_brush_stroke(1, &square, true)
        .and_then(|s| s.with_brush_stroke(2, &square, true))
        .expect("paint");

    let mut cache = MeshCache::new();
    let good = cached_socket(&state, &mut cache).expect("socket").clone();

    // erasing everything leaves the sentinel limb, which cannot be hulled
    let erased = state
        .with_slice_grid(1, grid_with(&[]))
        .and_then(|s| s.with_slice_grid(2, grid_with(&[])))
        .expect("erase");
    let err = cached_socket(&erased, &mut cache).expect_err("no limb");
    assert!(matches!(err, GeometryError::InsufficientGeometry { .. }));
    assert_eq!(cache.last_socket(), Some(&good));
}
