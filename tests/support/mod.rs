//! Test support library
//! Shared model builders and float helpers for the integration suites.
#![allow(dead_code)]

use limbshell::{
    float_types::Real,
    loft::Slice,
    mesher::MarchingCubesConfig,
    sketch::{GridCell, OccupancyGrid},
    state::PipelineSettings,
};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// A 20x20 grid with `cells` set.
pub fn grid_with(cells: &[(i32, i32)]) -> OccupancyGrid {
    OccupancyGrid::from_cells(20, cells.iter().map(|&c| GridCell::from(c)))
}

/// The 2x2 square at the centre of a 20x20 grid.
pub fn centre_square() -> Vec<(i32, i32)> {
    vec![(9, 9), (9, 10), (10, 9), (10, 10)]
}

/// Four slices: empty at 1.0 and 0.25, the centre square at 0.75 and 0.5.
pub fn reference_slices() -> Vec<Slice> {
    vec![
        Slice::new(1, 1.0, grid_with(&[])),
        Slice::new(2, 0.75, grid_with(&centre_square())),
        Slice::new(3, 0.5, grid_with(&centre_square())),
        Slice::new(4, 0.25, grid_with(&[])),
    ]
}

/// Default settings with a coarse lattice so suites stay quick.
pub fn quick_settings() -> PipelineSettings {
    PipelineSettings {
        marching_cubes: MarchingCubesConfig::default().with_resolution(18),
        ..PipelineSettings::default()
    }
}
