//! Geometry pipeline errors

use crate::primitive::BooleanOp;

/// Convenience alias used by every fallible operation in the crate.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// All the recoverable failures the geometry pipeline can report.
///
/// Empty slice content is deliberately *not* represented here: an empty limb
/// produces the sentinel [`IndexedMesh::empty`](crate::indexed_mesh::IndexedMesh::empty).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// A hull-based operation received fewer points than a tetrahedron needs
    #[error("(InsufficientGeometry) need at least {required} points, found {found}")]
    InsufficientGeometry { required: usize, found: usize },

    /// The hull kernel rejected the point set (coplanar, collinear or non-finite input)
    #[error("(DegenerateHull) {0}")]
    DegenerateHull(String),

    /// A mesh boolean could not produce a usable solid
    #[error("(BooleanOperationFailure) {operation} failed: {reason}")]
    BooleanOperationFailure { operation: BooleanOp, reason: String },

    /// No slice with this id exists in the model
    #[error("(UnknownSlice) no slice with id {0}")]
    UnknownSlice(u32),

    /// A slice with this id already exists in the model
    #[error("(DuplicateSlice) slice id {0} is already in use")]
    DuplicateSlice(u32),

    /// No primitive with this id exists in the model
    #[error("(UnknownPrimitive) no primitive with id {0}")]
    UnknownPrimitive(String),

    /// A grid edit addressed a cell outside `[0, size)`
    #[error("(CellOutOfBounds) cell ({row}, {col}) is outside a {size}x{size} grid")]
    CellOutOfBounds { row: usize, col: usize, size: usize },

    /// A grid of the wrong dimension was supplied
    #[error("(GridSizeMismatch) expected a {expected}x{expected} grid, found {found}x{found}")]
    GridSizeMismatch { expected: usize, found: usize },

    /// A mesh handed in by the caller is malformed (dangling index, mismatched normals)
    #[error("(InvalidMesh) {0}")]
    InvalidMesh(String),

    /// A configuration value is out of its valid range
    #[error("(InvalidConfig) {0}")]
    InvalidConfig(String),
}

impl GeometryError {
    /// Shorthand for building a [`GeometryError::BooleanOperationFailure`].
    pub fn boolean(operation: BooleanOp, reason: impl Into<String>) -> Self {
        GeometryError::BooleanOperationFailure {
            operation,
            reason: reason.into(),
        }
    }
}
