mod support;

use limbshell::loft::{LoftConfig, SkeletonKey, Slice, loft};
use support::{approx_eq, grid_with, reference_slices};

#[test]
fn loft_is_idempotent() {
    let slices = reference_slices();
    let config = LoftConfig::default();
    let a = loft(&slices, &config);
    let b = loft(&slices, &config);
    assert_eq!(a.key_set(), b.key_set());
    assert!(!a.is_empty());
}

#[test]
fn loft_ignores_input_order() {
    let mut slices = reference_slices();
    let config = LoftConfig::default();
    let forward = loft(&slices, &config);
    slices.reverse();
    assert_eq!(forward.key_set(), loft(&slices, &config).key_set());
}

#[test]
fn single_active_slice_is_copied_verbatim() {
    let slices = vec![
        Slice::new(1, 0.8, grid_with(&[])),
        Slice::new(2, 0.4, grid_with(&[(2, 2), (2, 3)])),
    ];
    let skeleton = loft(&slices, &LoftConfig::default());
    assert_eq!(skeleton.len(), 2);
    for p in skeleton.points() {
        assert!(approx_eq(p.y, 4.0, 1e-12));
    }
    let cols: Vec<i64> = skeleton.points().iter().map(|p| p.key().col).collect();
    assert_eq!(cols, vec![2, 3]);
}

#[test]
fn reference_slices_span_both_heights() {
    let skeleton = loft(&reference_slices(), &LoftConfig::default());
    let keys = skeleton.key_set();
    assert!(keys.contains(&SkeletonKey { row: 9, col: 9, y_milli: 7500 }));
    assert!(keys.contains(&SkeletonKey { row: 10, col: 10, y_milli: 5000 }));
    let [_, _, (y_min, y_max)] = skeleton.bounds().expect("non-empty");
    assert!(approx_eq(y_min, 5.0, 1e-12));
    assert!(approx_eq(y_max, 7.5, 1e-12));
}

#[test]
fn height_scale_stretches_the_skeleton() {
    let config = LoftConfig::default().with_height_scale(2.0);
    let skeleton = loft(&reference_slices(), &config);
    let [_, _, (_, y_max)] = skeleton.bounds().expect("non-empty");
    assert!(approx_eq(y_max, 1.5, 1e-12));
}
