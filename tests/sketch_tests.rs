mod support;

use limbshell::sketch::{GridCell, OccupancyGrid, apply_convex_brush, convex_hull, fill_polygon};

fn cells(points: &[(i32, i32)]) -> Vec<GridCell> {
    points.iter().map(|&p| GridCell::from(p)).collect()
}

/// Sign of the turn at `b` going a -> b -> c, with col as x and row as y.
fn turn(a: GridCell, b: GridCell, c: GridCell) -> i64 {
    let (abx, aby) = ((b.col - a.col) as i64, (b.row - a.row) as i64);
    let (bcx, bcy) = ((c.col - b.col) as i64, (c.row - b.row) as i64);
    abx * bcy - aby * bcx
}

fn inside_or_on(hull: &[GridCell], p: GridCell) -> bool {
    let n = hull.len();
    (0..n).all(|i| turn(hull[i], hull[(i + 1) % n], p) >= 0)
}

#[test]
fn hull_contains_every_input_point() {
    let points = cells(&[
        (3, 4), (7, 1), (12, 9), (2, 15), (8, 8), (5, 5), (14, 3), (10, 12), (6, 6), (3, 4),
    ]);
    let hull = convex_hull(&points);
    assert!(hull.len() >= 3);
    for &p in &points {
        assert!(inside_or_on(&hull, p), "{p:?} outside hull {hull:?}");
    }
}

#[test]
fn hull_is_convex() {
    let points = cells(&[(0, 0), (0, 10), (10, 10), (10, 0), (5, 5), (2, 8), (9, 1), (5, 0)]);
    let hull = convex_hull(&points);
    let n = hull.len();
    let signs: Vec<i64> = (0..n)
        .map(|i| turn(hull[i], hull[(i + 1) % n], hull[(i + 2) % n]).signum())
        .collect();
    assert!(signs.iter().all(|&s| s == signs[0] && s != 0), "{signs:?}");
    // collinear midpoint (5,0) is not a hull vertex
    assert_eq!(n, 4);
}

#[test]
fn fewer_than_three_unique_points_come_back_unchanged() {
    let points = cells(&[(4, 4), (6, 2), (4, 4)]);
    assert_eq!(convex_hull(&points), cells(&[(4, 4), (6, 2)]));
    assert!(convex_hull(&[]).is_empty());
}

#[test]
fn unit_square_fills_121_cells() {
    let hull = cells(&[(5, 5), (5, 15), (15, 15), (15, 5)]);
    let filled = fill_polygon(&hull, 20);
    assert_eq!(filled.len(), 121);
    for row in 5..=15 {
        for col in 5..=15 {
            assert!(filled.contains(&GridCell::new(row, col)));
        }
    }
}

#[test]
fn fill_clamps_to_the_grid() {
    let hull = cells(&[(-5, -5), (-5, 30), (30, 30), (30, -5)]);
    assert_eq!(fill_polygon(&hull, 20).len(), 400);
}

#[test]
fn brush_paints_a_slice_without_touching_the_original() {
    let blank = OccupancyGrid::new(20);
    let stroke = cells(&[(5, 5), (5, 15), (15, 15), (15, 5), (10, 10)]);
    let painted = apply_convex_brush(&blank, &stroke, true);
    assert_eq!(painted.active_count(), 121);
    assert_eq!(blank.active_count(), 0);
    let erased = apply_convex_brush(&painted, &cells(&[(5, 5), (5, 6), (6, 6), (6, 5)]), false);
    assert_eq!(erased.active_count(), 117);
}
