use crate::sketch::grid::{GridCell, OccupancyGrid};
use crate::sketch::hull::{convex_hull, fill_polygon, rasterize_segment};
use tracing::debug;

/// Cells a convex brush stroke covers: the filled convex hull of the stroke,
/// or the stroke's segment/point when it has fewer than three unique cells.
pub fn brush_cells(stroke: &[GridCell], grid_size: usize) -> Vec<GridCell> {
    let hull = convex_hull(stroke);
    match hull.as_slice() {
        [] => Vec::new(),
        [single] => fill_polygon(&[*single], grid_size),
        [a, b] => fill_polygon(&rasterize_segment(*a, *b), grid_size),
        _ => fill_polygon(&hull, grid_size),
    }
}

/// Apply a convex brush stroke, writing `value` into every covered cell.
///
/// Returns a new grid; the input is left untouched.
pub fn apply_convex_brush(grid: &OccupancyGrid, stroke: &[GridCell], value: bool) -> OccupancyGrid {
    let cells = brush_cells(stroke, grid.size());
    debug!(
        stroke = stroke.len(),
        covered = cells.len(),
        value,
        "applying convex brush"
    );
    let mut next = grid.clone();
    next.paint(cells, value);
    next
}
