mod support;

use limbshell::loft::{LoftConfig, SkeletonPoint, VoxelSkeleton, loft};
use limbshell::mesher::{GridFrame, LimbMesher, MarchingCubesConfig, MarchingCubesMesher, VoxelMesher};
use support::reference_slices;

fn lone_point() -> VoxelSkeleton {
    [SkeletonPoint::new(9.5, 9.5, 5.0)].into_iter().collect()
}

#[test]
fn both_meshers_return_the_sentinel_for_an_empty_skeleton() {
    let frame = GridFrame::default();
    let empty = VoxelSkeleton::new();
    for mesh in [
        VoxelMesher::new().mesh(&empty, &frame),
        MarchingCubesMesher::default().mesh(&empty, &frame),
    ] {
        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.triangle_count(), 0);
    }
}

#[test]
fn single_point_with_enough_padding_is_closed() {
    for padding in [None, Some(1.6), Some(4.0)] {
        let config = MarchingCubesConfig::default()
            .with_resolution(16)
            .with_padding(padding);
        let mesh = MarchingCubesMesher::new(config).mesh(&lone_point(), &GridFrame::default());
        assert!(!mesh.is_empty(), "padding {padding:?}");
        assert!(mesh.is_closed_manifold(), "padding {padding:?}");
        assert!(mesh.signed_volume() > 0.0);
    }
}

#[test]
fn insufficient_padding_opens_the_surface() {
    let config = MarchingCubesConfig::default()
        .with_resolution(16)
        .with_padding(Some(1.0));
    let mesh = MarchingCubesMesher::new(config).mesh(&lone_point(), &GridFrame::default());
    assert!(!mesh.is_empty());
    assert!(!mesh.is_closed_manifold());
}

#[test]
fn lofted_limb_is_closed_and_centred() {
    let skeleton = loft(&reference_slices(), &LoftConfig::default());
    let mesher = MarchingCubesMesher::new(MarchingCubesConfig::default().with_resolution(20));
    let mesh = mesher.mesh(&skeleton, &GridFrame::default());
    assert!(mesh.is_closed_manifold());
    let bb = mesh.bounding_box().expect("non-empty");
    // skeleton spans y 5..7.5 and the surface sits about 1.5 outside it
    assert!(bb.mins.y < 5.0 && bb.maxs.y > 7.5);
    assert!((bb.mins.x + bb.maxs.x).abs() < 1e-6);
    assert_eq!(mesh.normals.as_ref().map(Vec::len), Some(mesh.vertex_count()));
}

#[test]
fn voxel_limb_has_a_cuboid_per_skeleton_point() {
    let skeleton = loft(&reference_slices(), &LoftConfig::default());
    let mesh = VoxelMesher::new().mesh(&skeleton, &GridFrame::default());
    assert_eq!(mesh.triangle_count(), 12 * skeleton.len());
    assert_eq!(mesh.vertex_count(), 8 * skeleton.len());
}

#[test]
fn cell_size_scales_the_footprint() {
    let mesher = MarchingCubesMesher::new(MarchingCubesConfig::default().with_resolution(16));
    let narrow = mesher.mesh(&lone_point(), &GridFrame::default());
    let wide = mesher.mesh(&lone_point(), &GridFrame::default().with_cell_size(2.0));
    let (n, w) = (
        narrow.bounding_box().expect("non-empty"),
        wide.bounding_box().expect("non-empty"),
    );
    assert!(((w.maxs.x - w.mins.x) - 2.0 * (n.maxs.x - n.mins.x)).abs() < 1e-9);
    assert!(((w.maxs.y - w.mins.y) - (n.maxs.y - n.mins.y)).abs() < 1e-9);
}
