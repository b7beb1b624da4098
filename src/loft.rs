//! Organic loft: a 3D voxel skeleton interpolated between height-tagged slices.
//!
//! Consecutive active slices are joined by nearest-neighbour chains, first from
//! every upper cell down, then from every lower cell up so that no lower cell
//! is orphaned. Slices whose shapes differ a lot can give a ragged skeleton;
//! that is accepted in exchange for a loft that never fails.

use crate::errors::{GeometryError, GeometryResult};
use crate::float_types::Real;
use crate::sketch::{DEFAULT_GRID_SIZE, GridCell, OccupancyGrid};
use hashbrown::HashSet;
use tracing::{debug, warn};

/// One height-tagged cross section of the limb.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub id: u32,
    /// Normalized height: 1 is the top of the limb, 0 the extremity.
    pub height: Real,
    pub grid: OccupancyGrid,
    pub label: String,
}

impl Slice {
    pub fn new(id: u32, height: Real, grid: OccupancyGrid) -> Self {
        Slice {
            id,
            height,
            grid,
            label: format!("Slice {id}"),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// A slice counts towards the loft only when it has material.
    pub fn is_active(&self) -> bool {
        self.grid.has_material()
    }
}

/// A skeleton sample: fractional grid coordinates plus world height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkeletonPoint {
    pub row: Real,
    pub col: Real,
    pub y: Real,
}

/// Deduplication key: row and col to the nearest cell, height to 1e-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkeletonKey {
    pub row: i64,
    pub col: i64,
    pub y_milli: i64,
}

impl SkeletonPoint {
    pub const fn new(row: Real, col: Real, y: Real) -> Self {
        SkeletonPoint { row, col, y }
    }

    pub fn key(&self) -> SkeletonKey {
        SkeletonKey {
            row: self.row.round() as i64,
            col: self.col.round() as i64,
            y_milli: (self.y * 1000.0).round() as i64,
        }
    }

    fn lerp(&self, other: &SkeletonPoint, t: Real) -> SkeletonPoint {
        SkeletonPoint {
            row: self.row + (other.row - self.row) * t,
            col: self.col + (other.col - self.col) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Deduplicated skeleton points in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoxelSkeleton {
    points: Vec<SkeletonPoint>,
    keys: HashSet<SkeletonKey>,
}

impl VoxelSkeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `point` unless a point with the same key is already present.
    /// Returns whether it was inserted.
    pub fn insert(&mut self, point: SkeletonPoint) -> bool {
        if self.keys.insert(point.key()) {
            self.points.push(point);
            true
        } else {
            false
        }
    }

    pub fn points(&self) -> &[SkeletonPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The set of dedup keys, for order-independent comparison.
    pub fn key_set(&self) -> &HashSet<SkeletonKey> {
        &self.keys
    }

    /// Per-axis `(min, max)` of row, col and y, `None` when empty.
    pub fn bounds(&self) -> Option<[(Real, Real); 3]> {
        let first = self.points.first()?;
        let init = [(first.row, first.row), (first.col, first.col), (first.y, first.y)];
        Some(self.points.iter().fold(init, |[r, c, y], p| {
            [
                (r.0.min(p.row), r.1.max(p.row)),
                (c.0.min(p.col), c.1.max(p.col)),
                (y.0.min(p.y), y.1.max(p.y)),
            ]
        }))
    }
}

impl FromIterator<SkeletonPoint> for VoxelSkeleton {
    fn from_iter<I: IntoIterator<Item = SkeletonPoint>>(iter: I) -> Self {
        let mut skeleton = VoxelSkeleton::new();
        for p in iter {
            skeleton.insert(p);
        }
        skeleton
    }
}

/// Loft parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoftConfig {
    /// Dimension N of every slice's N×N grid.
    pub grid_size: usize,
    /// Interpolation intervals per chain; each chain emits `steps + 1` samples.
    pub interpolation_steps: usize,
    /// World units per unit of normalized height.
    pub height_scale: Real,
}

impl Default for LoftConfig {
    fn default() -> Self {
        LoftConfig {
            grid_size: DEFAULT_GRID_SIZE,
            interpolation_steps: 10,
            height_scale: 10.0,
        }
    }
}

impl LoftConfig {
    pub const fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub const fn with_interpolation_steps(mut self, steps: usize) -> Self {
        self.interpolation_steps = steps;
        self
    }

    pub const fn with_height_scale(mut self, height_scale: Real) -> Self {
        self.height_scale = height_scale;
        self
    }

    pub fn validate(&self) -> GeometryResult<()> {
        if self.grid_size == 0 {
            return Err(GeometryError::InvalidConfig("grid_size must be at least 1".into()));
        }
        if self.interpolation_steps == 0 {
            return Err(GeometryError::InvalidConfig(
                "interpolation_steps must be at least 1".into(),
            ));
        }
        if !(self.height_scale.is_finite() && self.height_scale > 0.0) {
            return Err(GeometryError::InvalidConfig(format!(
                "height_scale must be positive, got {}",
                self.height_scale
            )));
        }
        Ok(())
    }
}

/// Active slices ordered top to bottom (descending height, ties by id).
pub fn active_slices(slices: &[Slice]) -> Vec<&Slice> {
    let mut active: Vec<&Slice> = slices.iter().filter(|s| s.is_active()).collect();
    active.sort_by(|a, b| b.height.total_cmp(&a.height).then(a.id.cmp(&b.id)));
    active
}

/// First cell of `candidates` (row-major) closest to `cell`.
fn nearest(cell: GridCell, candidates: &[GridCell]) -> Option<GridCell> {
    candidates
        .iter()
        .copied()
        .min_by_key(|c| cell.distance_squared(c))
}

fn cell_point(cell: GridCell, y: Real) -> SkeletonPoint {
    SkeletonPoint::new(cell.row as Real, cell.col as Real, y)
}

/// Emit `steps + 1` samples from `from` to `to`, inclusive.
fn chain(skeleton: &mut VoxelSkeleton, from: SkeletonPoint, to: SkeletonPoint, steps: usize) {
    for s in 0..=steps {
        let t = s as Real / steps as Real;
        skeleton.insert(from.lerp(&to, t));
    }
}

/// Build the voxel skeleton of a limb from its slices.
///
/// Input order does not matter. No active slice gives an empty skeleton; a
/// single active slice gives exactly its cells at its scaled height. Slices
/// whose grid is not `config.grid_size` wide are left out with a warning.
pub fn loft(slices: &[Slice], config: &LoftConfig) -> VoxelSkeleton {
    let mut active = active_slices(slices);
    active.retain(|s| {
        let fits = s.grid.size() == config.grid_size;
        if !fits {
            warn!(
                slice = s.id,
                size = s.grid.size(),
                expected = config.grid_size,
                "slice grid size does not match the loft, ignoring it"
            );
        }
        fits
    });
    let steps = config.interpolation_steps.max(1);
    let mut skeleton = VoxelSkeleton::new();

    match active.as_slice() {
        [] => {},
        [only] => {
            let y = only.height * config.height_scale;
            for cell in only.grid.active_cells() {
                skeleton.insert(cell_point(cell, y));
            }
        },
        _ => {
            for pair in active.windows(2) {
                let (upper, lower) = (pair[0], pair[1]);
                let upper_y = upper.height * config.height_scale;
                let lower_y = lower.height * config.height_scale;
                let upper_cells = upper.grid.active_cells();
                let lower_cells = lower.grid.active_cells();

                for &cell in &upper_cells {
                    if let Some(target) = nearest(cell, &lower_cells) {
                        chain(&mut skeleton, cell_point(cell, upper_y), cell_point(target, lower_y), steps);
                    }
                }
                for &cell in &lower_cells {
                    if let Some(target) = nearest(cell, &upper_cells) {
                        chain(&mut skeleton, cell_point(cell, lower_y), cell_point(target, upper_y), steps);
                    }
                }
            }
        },
    }

    debug!(
        slices = slices.len(),
        active = active.len(),
        points = skeleton.len(),
        "lofted voxel skeleton"
    );
    skeleton
}
