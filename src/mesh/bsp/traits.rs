//! Splitting-plane selection for BSP construction

use crate::float_types::Real;
use crate::mesh::plane::{BACK, COPLANAR, FRONT, Plane};
use crate::mesh::polygon::Polygon;

/// Trait for picking the splitting plane of a BSP node
pub trait SplittingPlaneStrategy<S: Clone> {
    /// Pick the best splitting plane from a non-empty set of polygons
    fn pick_best_splitting_plane(&self, polygons: &[Polygon<S>]) -> Plane;
}

/// Always split on the first polygon's plane (the classic csg.js choice).
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstPolygonStrategy;

impl<S: Clone> SplittingPlaneStrategy<S> for FirstPolygonStrategy {
    fn pick_best_splitting_plane(&self, polygons: &[Polygon<S>]) -> Plane {
        polygons[0].plane.clone()
    }
}

/// Score a sample of candidate planes by how many polygons they would cut and
/// how unevenly they would divide the rest.
#[derive(Debug, Clone, Copy)]
pub struct BalancedSplittingStrategy {
    pub span_weight: Real,
    pub balance_weight: Real,
    pub sample_size: usize,
}

impl Default for BalancedSplittingStrategy {
    fn default() -> Self {
        Self {
            span_weight: 8.0,
            balance_weight: 1.0,
            sample_size: 20,
        }
    }
}

impl<S: Clone> SplittingPlaneStrategy<S> for BalancedSplittingStrategy {
    fn pick_best_splitting_plane(&self, polygons: &[Polygon<S>]) -> Plane {
        let mut best_plane = &polygons[0].plane;
        let mut best_score = Real::MAX;

        for candidate in polygons.iter().take(self.sample_size.max(1)) {
            let plane = &candidate.plane;
            let (num_front, num_back, num_spanning) =
                polygons
                    .iter()
                    .fold((0_i64, 0_i64, 0_i64), |acc, poly| match plane.classify_polygon(poly) {
                        COPLANAR => acc,
                        FRONT => (acc.0 + 1, acc.1, acc.2),
                        BACK => (acc.0, acc.1 + 1, acc.2),
                        _ => (acc.0, acc.1, acc.2 + 1),
                    });

            let score = self.span_weight * num_spanning as Real
                + self.balance_weight * ((num_front - num_back) as Real).abs();

            if score < best_score {
                best_score = score;
                best_plane = plane;
            }
        }

        best_plane.clone()
    }
}
