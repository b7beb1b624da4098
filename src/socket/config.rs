use crate::errors::{GeometryError, GeometryResult};
use crate::float_types::Real;
use crate::primitive::DEFAULT_PRIMITIVE_SEGMENTS;

/// Socket shell parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocketConfig {
    /// Wall thickness added outward from the limb surface.
    pub thickness: Real,
    /// Use the convex hull of the limb as the inner surface instead of the
    /// limb mesh itself.
    pub use_convex_hull: bool,
    /// How far below the limb's top the opening cut sits.
    pub top_cut_epsilon: Real,
    /// Segment count for sphere and cylinder primitives.
    pub primitive_segments: usize,
}

impl Default for SocketConfig {
    fn default() -> Self {
        SocketConfig {
            thickness: 0.5,
            use_convex_hull: true,
            top_cut_epsilon: 0.05,
            primitive_segments: DEFAULT_PRIMITIVE_SEGMENTS,
        }
    }
}

impl SocketConfig {
    pub const fn with_thickness(mut self, thickness: Real) -> Self {
        self.thickness = thickness;
        self
    }

    pub const fn with_convex_hull(mut self, use_convex_hull: bool) -> Self {
        self.use_convex_hull = use_convex_hull;
        self
    }

    pub const fn with_top_cut_epsilon(mut self, epsilon: Real) -> Self {
        self.top_cut_epsilon = epsilon;
        self
    }

    pub const fn with_primitive_segments(mut self, segments: usize) -> Self {
        self.primitive_segments = segments;
        self
    }

    pub fn validate(&self) -> GeometryResult<()> {
        if !(self.thickness.is_finite() && self.thickness > 0.0) {
            return Err(GeometryError::InvalidConfig(format!(
                "socket thickness must be positive, got {}",
                self.thickness
            )));
        }
        if !(self.top_cut_epsilon.is_finite() && self.top_cut_epsilon >= 0.0) {
            return Err(GeometryError::InvalidConfig(format!(
                "top cut epsilon must be non-negative, got {}",
                self.top_cut_epsilon
            )));
        }
        if self.primitive_segments < 3 {
            return Err(GeometryError::InvalidConfig(format!(
                "primitive segments must be at least 3, got {}",
                self.primitive_segments
            )));
        }
        Ok(())
    }
}
