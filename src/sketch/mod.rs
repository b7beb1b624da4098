//! Slice-plane drawing primitives: occupancy grids, 2D convex hull,
//! scanline fill and convex brush strokes.

pub mod brush;
pub mod grid;
pub mod hull;

pub use brush::{apply_convex_brush, brush_cells};
pub use grid::{DEFAULT_GRID_SIZE, GridCell, OccupancyGrid};
pub use hull::{convex_hull, fill_polygon, rasterize_segment};
