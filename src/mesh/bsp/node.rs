//! [BSP](https://en.wikipedia.org/wiki/Binary_space_partitioning) tree node structure and operations

use crate::mesh::bsp::traits::{BalancedSplittingStrategy, SplittingPlaneStrategy};
use crate::mesh::plane::Plane;
use crate::mesh::polygon::Polygon;

/// A BSP tree node, containing polygons plus optional front/back subtrees.
///
/// Every traversal below is iterative: a closed convex solid produces a
/// degenerate, list-shaped tree whose depth equals its face count.
#[derive(Debug, Clone)]
pub struct Node<S: Clone> {
    /// Splitting plane for this node *or* **None** for an empty leaf.
    pub plane: Option<Plane>,

    /// Polygons in *front* half‑spaces.
    pub front: Option<Box<Node<S>>>,

    /// Polygons in *back* half‑spaces.
    pub back: Option<Box<Node<S>>>,

    /// Polygons that lie *exactly* on `plane`
    pub polygons: Vec<Polygon<S>>,
}

impl<S: Clone> Default for Node<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone> Node<S> {
    /// Create a new empty BSP node
    pub const fn new() -> Self {
        Self {
            plane: None,
            front: None,
            back: None,
            polygons: Vec::new(),
        }
    }

    /// Creates a new BSP tree from polygons
    pub fn from_polygons(polygons: &[Polygon<S>]) -> Self {
        let mut node = Self::new();
        node.build(polygons);
        node
    }

    /// Convert solid space to empty space and empty space to solid space.
    pub fn invert(&mut self) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            node.polygons.iter_mut().for_each(|p| p.flip());
            if let Some(plane) = node.plane.as_mut() {
                plane.flip();
            }
            std::mem::swap(&mut node.front, &mut node.back);
            if let Some(front) = node.front.as_mut() {
                stack.push(front.as_mut());
            }
            if let Some(back) = node.back.as_mut() {
                stack.push(back.as_mut());
            }
        }
    }

    /// Recursively remove all polygons in `polygons` that are inside this BSP tree
    pub fn clip_polygons(&self, polygons: &[Polygon<S>]) -> Vec<Polygon<S>> {
        let mut result = Vec::new();
        let mut stack = vec![(self, polygons.to_vec())];

        while let Some((node, polys)) = stack.pop() {
            let Some(plane) = node.plane.as_ref() else {
                result.extend(polys);
                continue;
            };

            let mut front_polys = Vec::with_capacity(polys.len());
            let mut back_polys = Vec::with_capacity(polys.len());

            for polygon in &polys {
                let (coplanar_front, coplanar_back, front_parts, back_parts) =
                    plane.split_polygon(polygon);
                front_polys.extend(coplanar_front);
                front_polys.extend(front_parts);
                back_polys.extend(coplanar_back);
                back_polys.extend(back_parts);
            }

            match node.front.as_deref() {
                Some(front) if !front_polys.is_empty() => stack.push((front, front_polys)),
                Some(_) => {},
                None => result.extend(front_polys),
            }

            // Polygons falling behind a leaf are inside the solid and discarded.
            if let Some(back) = node.back.as_deref() {
                if !back_polys.is_empty() {
                    stack.push((back, back_polys));
                }
            }
        }
        result
    }

    /// Remove all polygons in this BSP tree that are inside the other BSP tree
    pub fn clip_to(&mut self, bsp: &Node<S>) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            node.polygons = bsp.clip_polygons(&node.polygons);
            if let Some(front) = node.front.as_mut() {
                stack.push(front.as_mut());
            }
            if let Some(back) = node.back.as_mut() {
                stack.push(back.as_mut());
            }
        }
    }

    /// Return all polygons in this BSP tree
    pub fn all_polygons(&self) -> Vec<Polygon<S>> {
        let mut result = Vec::new();
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            result.extend_from_slice(&node.polygons);
            stack.extend(
                [&node.front, &node.back]
                    .iter()
                    .filter_map(|child| child.as_deref()),
            );
        }
        result
    }

    /// Build (or extend) a BSP tree from the given polygons using the balanced
    /// splitting heuristic.
    pub fn build(&mut self, polygons: &[Polygon<S>]) {
        self.build_with(polygons, &BalancedSplittingStrategy::default());
    }

    /// Build (or extend) a BSP tree with an explicit splitting strategy.
    pub fn build_with<SP: SplittingPlaneStrategy<S>>(&mut self, polygons: &[Polygon<S>], strategy: &SP) {
        if polygons.is_empty() {
            return;
        }

        let mut stack = vec![(self, polygons.to_vec())];

        while let Some((node, polys)) = stack.pop() {
            if polys.is_empty() {
                continue;
            }

            let plane = node
                .plane
                .get_or_insert_with(|| strategy.pick_best_splitting_plane(&polys))
                .clone();

            let mut front = Vec::with_capacity(polys.len() / 2);
            let mut back = Vec::with_capacity(polys.len() / 2);

            for polygon in &polys {
                let (coplanar_front, coplanar_back, front_parts, back_parts) =
                    plane.split_polygon(polygon);
                node.polygons.extend(coplanar_front);
                node.polygons.extend(coplanar_back);
                front.extend(front_parts);
                back.extend(back_parts);
            }

            if !front.is_empty() {
                let front_node = node.front.get_or_insert_with(|| Box::new(Node::new()));
                stack.push((front_node.as_mut(), front));
            }

            if !back.is_empty() {
                let back_node = node.back.get_or_insert_with(|| Box::new(Node::new()));
                stack.push((back_node.as_mut(), back));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use crate::traits::CSG;

    #[test]
    fn build_keeps_every_face_of_a_cube() {
        let cube: Mesh<()> = Mesh::cube(2.0, None);
        let node = Node::from_polygons(&cube.polygons);
        assert_eq!(node.all_polygons().len(), 6);
    }

    #[test]
    fn polygons_outside_are_kept() {
        let cube: Mesh<()> = Mesh::cube(1.0, None);
        let far: Mesh<()> = Mesh::cube(1.0, None).translate(10.0, 0.0, 0.0);
        let node = Node::from_polygons(&cube.polygons);
        assert_eq!(node.clip_polygons(&far.polygons).len(), 6);
    }

    #[test]
    fn invert_twice_restores_tree() {
        let cube: Mesh<()> = Mesh::cube(1.0, None);
        let mut node = Node::from_polygons(&cube.polygons);
        let before = node.plane.clone();
        node.invert();
        assert_ne!(node.plane, before);
        node.invert();
        assert_eq!(node.plane, before);
    }

    #[test]
    fn polygons_inside_are_removed() {
        let outer: Mesh<()> = Mesh::cube(4.0, None);
        let inner: Mesh<()> = Mesh::cube(1.0, None);
        let node = Node::from_polygons(&outer.polygons);
        assert!(node.clip_polygons(&inner.polygons).is_empty());
    }
}
