//! Square boolean occupancy grids, one per slice.

use crate::errors::{GeometryError, GeometryResult};

/// Default grid dimension of a drawing slice.
pub const DEFAULT_GRID_SIZE: usize = 20;

/// Integer `(row, col)` grid coordinate.
///
/// Signed so that brush strokes may wander past the grid edge; consumers
/// clamp to `[0, size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub row: i32,
    pub col: i32,
}

impl GridCell {
    pub const fn new(row: i32, col: i32) -> Self {
        GridCell { row, col }
    }

    /// Squared Euclidean distance in grid units.
    pub const fn distance_squared(&self, other: &GridCell) -> i64 {
        let dr = (self.row - other.row) as i64;
        let dc = (self.col - other.col) as i64;
        dr * dr + dc * dc
    }
}

impl From<(i32, i32)> for GridCell {
    fn from((row, col): (i32, i32)) -> Self {
        GridCell::new(row, col)
    }
}

/// An N×N array of booleans, `true` meaning material at `(row, col)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OccupancyGrid {
    size: usize,
    cells: Vec<bool>,
}

impl Default for OccupancyGrid {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE)
    }
}

impl OccupancyGrid {
    /// An all-`false` grid of dimension `size`.
    pub fn new(size: usize) -> Self {
        OccupancyGrid {
            size,
            cells: vec![false; size * size],
        }
    }

    /// A grid with exactly the given cells set; cells outside the grid are
    /// ignored.
    pub fn from_cells<I>(size: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = GridCell>,
    {
        let mut grid = Self::new(size);
        for cell in cells {
            if let Some(i) = grid.index_of(cell) {
                grid.cells[i] = true;
            }
        }
        grid
    }

    /// Build from nested rows; every row must be `rows.len()` long.
    pub fn from_rows(rows: &[Vec<bool>]) -> GeometryResult<Self> {
        let size = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != size) {
            return Err(GeometryError::GridSizeMismatch {
                expected: size,
                found: bad.len(),
            });
        }
        Ok(OccupancyGrid {
            size,
            cells: rows.iter().flatten().copied().collect(),
        })
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    fn index_of(&self, cell: GridCell) -> Option<usize> {
        let (row, col) = (usize::try_from(cell.row).ok()?, usize::try_from(cell.col).ok()?);
        (row < self.size && col < self.size).then_some(row * self.size + col)
    }

    /// Whether `(row, col)` is set; out-of-range cells read as `false`.
    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size && self.cells[row * self.size + col]
    }

    /// Set a single cell.
    pub fn set(&mut self, row: usize, col: usize, value: bool) -> GeometryResult<()> {
        if row >= self.size || col >= self.size {
            return Err(GeometryError::CellOutOfBounds {
                row,
                col,
                size: self.size,
            });
        }
        self.cells[row * self.size + col] = value;
        Ok(())
    }

    /// Copy of this grid with one cell changed.
    pub fn with_cell(&self, row: usize, col: usize, value: bool) -> GeometryResult<Self> {
        let mut next = self.clone();
        next.set(row, col, value)?;
        Ok(next)
    }

    /// Write `value` to every in-range cell, ignoring the rest.
    pub fn paint<I>(&mut self, cells: I, value: bool)
    where
        I: IntoIterator<Item = GridCell>,
    {
        for cell in cells {
            if let Some(i) = self.index_of(cell) {
                self.cells[i] = value;
            }
        }
    }

    /// Set cells in row-major order.
    pub fn active_cells(&self) -> Vec<GridCell> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &on)| on)
            .map(|(i, _)| GridCell::new((i / self.size) as i32, (i % self.size) as i32))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|&&on| on).count()
    }

    /// True when at least one cell is set.
    pub fn has_material(&self) -> bool {
        self.cells.iter().any(|&on| on)
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = false);
    }
}
