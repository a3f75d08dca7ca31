use glam::Vec3;

use crate::world::geometry::{Level, LeafId, NodeRef, Span};

// ──────────────────────────────────────────────────────────────────────────
//                       Level – tree queries
// ──────────────────────────────────────────────────────────────────────────
impl Level {
    /// The root of the world tree is always node 0.
    pub const ROOT: NodeRef = NodeRef::Node(0);

    /// Walk the BSP and return the leaf containing `p`.
    ///
    /// Points exactly on a splitter belong to its front side.
    pub fn find_leaf(&self, p: Vec3) -> LeafId {
        let mut child = Self::ROOT;
        loop {
            match child {
                NodeRef::Leaf(leaf) => return leaf,
                NodeRef::Node(idx) => {
                    let node = &self.nodes[idx];
                    let side = (self.planes[node.plane].distance(p) < 0.0) as usize;
                    child = node.children[side];
                }
            }
        }
    }

    /// Visibility cluster of the leaf containing `p`.
    #[inline]
    pub fn cluster_at(&self, p: Vec3) -> i32 {
        self.leaves[self.find_leaf(p)].cluster
    }

    /// Can cluster `test` be seen from cluster `current`?
    #[inline]
    pub fn is_cluster_visible(&self, current: i32, test: i32) -> bool {
        self.vis.is_visible(current, test)
    }

    /// Face ids referenced by `leaf` (may overlap with other leaves).
    pub fn leaf_face_ids(&self, leaf: LeafId) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.window(&self.leaf_faces, self.leaves[leaf].faces)
    }

    /// Brush ids referenced by `leaf`.
    pub fn leaf_brush_ids(&self, leaf: LeafId) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.window(&self.leaf_brushes, self.leaves[leaf].brushes)
    }

    fn window<'a>(&self, table: &'a [u32], span: Span) -> impl DoubleEndedIterator<Item = usize> + 'a {
        table[span.range()].iter().map(|&i| i as usize)
    }
}

// ──────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::geometry::{Aabb, Leaf, Node, Plane};
    use crate::world::vis::VisData;

    fn leaf(cluster: i32) -> Leaf {
        Leaf {
            cluster,
            area: 0,
            bounds: Aabb::default(),
            faces: Span::default(),
            brushes: Span::default(),
        }
    }

    /// x = 0 splits the world; the front half is split again by z = 0.
    ///
    /// ```text
    ///   node0 (x)  ── front ─► node1 (z) ── front ─► leaf 1
    ///        │                      └──── back  ─► leaf 2
    ///        └──── back  ─► leaf 0
    /// ```
    fn quadrants() -> Level {
        Level {
            planes: vec![
                Plane {
                    normal: Vec3::X,
                    dist: 0.0,
                },
                Plane {
                    normal: Vec3::Z,
                    dist: 0.0,
                },
            ],
            nodes: vec![
                Node {
                    plane: 0,
                    children: [NodeRef::from_raw(1), NodeRef::from_raw(-1)],
                    bounds: Aabb::default(),
                },
                Node {
                    plane: 1,
                    children: [NodeRef::from_raw(-2), NodeRef::from_raw(-3)],
                    bounds: Aabb::default(),
                },
            ],
            leaves: vec![leaf(0), leaf(1), leaf(-1)],
            vis: VisData::new(2, 1, vec![0b01, 0b11]),
            ..Default::default()
        }
    }

    #[test]
    fn find_leaf_descends_both_sides() {
        let lvl = quadrants();
        assert_eq!(lvl.find_leaf(Vec3::new(-5.0, 0.0, 3.0)), 0);
        assert_eq!(lvl.find_leaf(Vec3::new(5.0, 0.0, 3.0)), 1);
        assert_eq!(lvl.find_leaf(Vec3::new(5.0, 0.0, -3.0)), 2);
    }

    #[test]
    fn on_plane_goes_front() {
        let lvl = quadrants();
        assert_eq!(lvl.find_leaf(Vec3::ZERO), 1);
    }

    #[test]
    fn find_leaf_always_in_range() {
        let lvl = quadrants();
        for x in -4..=4 {
            for z in -4..=4 {
                let p = Vec3::new(x as f32 * 7.5, 1.0, z as f32 * 7.5);
                assert!(lvl.find_leaf(p) < lvl.leaves.len());
            }
        }
    }

    #[test]
    fn cluster_lookup_through_level() {
        let lvl = quadrants();
        assert_eq!(lvl.cluster_at(Vec3::new(-1.0, 0.0, 0.0)), 0);
        assert!(lvl.is_cluster_visible(1, 0));
        assert!(!lvl.is_cluster_visible(0, 1));
        assert!(lvl.is_cluster_visible(-1, 1));
    }
}
