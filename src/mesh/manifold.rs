use crate::float_types::Real;
use crate::mesh::Mesh;
use hashbrown::HashMap;
use nalgebra::Point3;
use std::fmt::Debug;

impl<S: Clone + Debug + Send + Sync> Mesh<S> {
    /// Checks if the Mesh object is manifold
    ///
    /// ### Returns
    /// Returns `true` if every edge appears exactly 2 times
    ///
    /// ### Notes:
    /// - BSP output may contain T-junctions; those report as non-manifold
    ///   even though the surface is watertight.
    /// - Uses a `QUANTIZATION_FACTOR` for `Real` coordinates
    pub fn is_manifold(&self) -> bool {
        const QUANTIZATION_FACTOR: Real = 1e7;

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        struct QuantizedPoint(i64, i64, i64);

        fn quantize_point(p: &Point3<Real>) -> QuantizedPoint {
            QuantizedPoint(
                (p.x * QUANTIZATION_FACTOR).round() as i64,
                (p.y * QUANTIZATION_FACTOR).round() as i64,
                (p.z * QUANTIZATION_FACTOR).round() as i64,
            )
        }

        // Triangulate the whole shape once
        let tri_mesh = self.triangulate();
        if tri_mesh.polygons.is_empty() {
            return false;
        }
        let mut edge_counts: HashMap<(QuantizedPoint, QuantizedPoint), u32> = HashMap::new();

        for poly in &tri_mesh.polygons {
            for &(i0, i1) in &[(0, 1), (1, 2), (2, 0)] {
                let p0 = quantize_point(&poly.vertices[i0].pos);
                let p1 = quantize_point(&poly.vertices[i1].pos);

                // (p0, p1) and (p1, p0) share a key
                let key = if p0 < p1 { (p0, p1) } else { (p1, p0) };
                *edge_counts.entry(key).or_insert(0) += 1;
            }
        }

        edge_counts.values().all(|&count| count == 2)
    }
}
