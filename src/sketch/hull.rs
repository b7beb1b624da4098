//! 2D convex hull and scanline polygon fill over grid coordinates.

use crate::sketch::grid::GridCell;
use hashbrown::HashSet;

/// z-component of `(a - o) × (b - o)` with `col` as x and `row` as y.
const fn cross(o: GridCell, a: GridCell, b: GridCell) -> i64 {
    (a.col - o.col) as i64 * (b.row - o.row) as i64 - (a.row - o.row) as i64 * (b.col - o.col) as i64
}

/// Remove duplicate cells, keeping first occurrences in input order.
fn unique_cells(points: &[GridCell]) -> Vec<GridCell> {
    let mut seen = HashSet::with_capacity(points.len());
    points.iter().copied().filter(|p| seen.insert(*p)).collect()
}

/// Convex hull of grid cells (Andrew's monotone chain).
///
/// Points are sorted by `(col, row)`; lower and upper chains drop any point
/// that does not make a strict left turn, so collinear points are removed.
/// Fewer than three unique points are returned unchanged (deduplicated).
pub fn convex_hull(points: &[GridCell]) -> Vec<GridCell> {
    let unique = unique_cells(points);
    if unique.len() < 3 {
        return unique;
    }

    let mut sorted = unique;
    sorted.sort_by_key(|p| (p.col, p.row));

    let mut lower: Vec<GridCell> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<GridCell> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    // each chain's last point is the other chain's first
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Cells covered by a hull polygon on a `grid_size` grid.
///
/// Interior rows are filled with an even-odd scanline using the half-open
/// `p1.row <= row < p2.row` edge rule; the hull's own edges are then
/// rasterized so that the closing row of a flat-topped or flat-bottomed
/// polygon is covered too. Everything is clamped to `[0, grid_size)`.
pub fn fill_polygon(hull: &[GridCell], grid_size: usize) -> Vec<GridCell> {
    let Some(limit) = i32::try_from(grid_size).ok().filter(|&n| n > 0) else {
        return Vec::new();
    };
    if hull.is_empty() {
        return Vec::new();
    }

    let mut filled: HashSet<GridCell> = HashSet::new();
    let mut ordered: Vec<GridCell> = Vec::new();
    let mut emit = |cell: GridCell| {
        if (0..limit).contains(&cell.row) && (0..limit).contains(&cell.col) && filled.insert(cell) {
            ordered.push(cell);
        }
    };

    let min_row = hull.iter().map(|p| p.row).min().unwrap_or(0).max(0);
    let max_row = hull.iter().map(|p| p.row).max().unwrap_or(0).min(limit - 1);

    let n = hull.len();
    for row in min_row..=max_row {
        let mut xs: Vec<f64> = Vec::new();
        for i in 0..n {
            let p1 = hull[i];
            let p2 = hull[(i + 1) % n];
            if (p1.row <= row && p2.row > row) || (p2.row <= row && p1.row > row) {
                let t = f64::from(row - p1.row) / f64::from(p2.row - p1.row);
                xs.push(f64::from(p1.col) + t * f64::from(p2.col - p1.col));
            }
        }
        xs.sort_by(f64::total_cmp);

        for pair in xs.chunks_exact(2) {
            let start = (pair[0].ceil() as i32).max(0);
            let end = (pair[1].floor() as i32).min(limit - 1);
            for col in start..=end {
                emit(GridCell::new(row, col));
            }
        }
    }

    for i in 0..n {
        for cell in rasterize_segment(hull[i], hull[(i + 1) % n]) {
            emit(cell);
        }
    }

    ordered.sort();
    ordered
}

/// Grid cells along the segment `a..=b` (DDA, one cell per major-axis step).
pub fn rasterize_segment(a: GridCell, b: GridCell) -> Vec<GridCell> {
    let dr = b.row - a.row;
    let dc = b.col - a.col;
    let steps = dr.abs().max(dc.abs());
    if steps == 0 {
        return vec![a];
    }
    (0..=steps)
        .map(|s| {
            let t = f64::from(s) / f64::from(steps);
            GridCell::new(
                (f64::from(a.row) + t * f64::from(dr)).round() as i32,
                (f64::from(a.col) + t * f64::from(dc)).round() as i32,
            )
        })
        .collect()
}
