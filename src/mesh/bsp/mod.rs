//! Binary Space Partitioning (BSP) tree implementation
//!
//! The tree drives every boolean operation on [`Mesh`](crate::mesh::Mesh);
//! the splitting-plane choice is pluggable through [`SplittingPlaneStrategy`].

pub mod node;
pub mod traits;

pub use node::Node;
pub use traits::{BalancedSplittingStrategy, FirstPolygonStrategy, SplittingPlaneStrategy};
