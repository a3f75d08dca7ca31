//! Quadratic Bezier patch tessellation.
//!
//! A patch face stores a `width × height` grid of control points; every
//! overlapping 3×3 block (stride 2) is one quadratic sub-patch.

use crate::world::geometry::Vertex;

/// Default subdivision level per sub-patch edge.
pub const BEZIER_LEVEL: usize = 3;

/// Number of 3×3 sub-patches along each axis of a `size` control grid.
#[inline]
pub fn sub_patch_counts(size: [i32; 2]) -> (usize, usize) {
    let dim = |n: i32| if n >= 3 { ((n - 1) / 2) as usize } else { 0 };
    (dim(size[0]), dim(size[1]))
}

/// Copy the 3×3 control block starting at `offset` out of a grid `width`
/// points wide.
pub fn control_block(vertices: &[Vertex], offset: usize, width: usize) -> [Vertex; 9] {
    let mut controls = [Vertex::default(); 9];
    for row in 0..3 {
        let src = offset + row * width;
        controls[row * 3..row * 3 + 3].copy_from_slice(&vertices[src..src + 3]);
    }
    controls
}

#[inline(always)]
fn quadratic(p0: Vertex, p1: Vertex, p2: Vertex, a: f32) -> Vertex {
    let b = 1.0 - a;
    p0 * (b * b) + p1 * (2.0 * b * a) + p2 * (a * a)
}

/// Evaluate one sub-patch on an `(level+1)²` grid, appending the vertices to
/// `vertices` and `level² * 6` absolute indices to `indices`.
pub fn tessellate(controls: &[Vertex; 9], level: usize, vertices: &mut Vec<Vertex>, indices: &mut Vec<u32>) {
    let level = level.max(1);
    let l1 = level + 1;
    let base = vertices.len() as u32;

    vertices.reserve(l1 * l1);
    for i in 0..=level {
        let a = i as f32 / level as f32;
        // blend each control row at `a`, then across the rows
        let row = |k: usize| quadratic(controls[k], controls[k + 1], controls[k + 2], a);
        let (t0, t1, t2) = (row(0), row(3), row(6));
        for j in 0..=level {
            vertices.push(quadratic(t0, t1, t2, j as f32 / level as f32));
        }
    }

    let at = |i: usize, j: usize| base + (i * l1 + j) as u32;
    indices.reserve(level * level * 6);
    for i in 0..level {
        for j in 0..level {
            indices.extend_from_slice(&[
                at(i, j),
                at(i, j + 1),
                at(i + 1, j + 1),
                at(i + 1, j + 1),
                at(i + 1, j),
                at(i, j),
            ]);
        }
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    /// 3×3 controls on the plane y = 4, spanning x,z ∈ [0, 2].
    fn flat_controls() -> [Vertex; 9] {
        let mut c = [Vertex::default(); 9];
        for r in 0..3 {
            for k in 0..3 {
                c[r * 3 + k] = Vertex {
                    position: Vec3::new(k as f32, 4.0, r as f32),
                    tex_coord: Vec2::new(k as f32 * 0.5, r as f32 * 0.5),
                    normal: Vec3::Y,
                    ..Default::default()
                };
            }
        }
        c
    }

    #[test]
    fn flat_patch_grid() {
        let mut verts = vec![Vertex::default(); 5];
        let mut idx = Vec::new();
        tessellate(&flat_controls(), BEZIER_LEVEL, &mut verts, &mut idx);

        assert_eq!(verts.len(), 5 + 16);
        assert_eq!(idx.len(), 3 * 3 * 6);
        for v in &verts[5..] {
            assert!((v.position.y - 4.0).abs() < 1e-5);
            assert!(v.position.x > -1e-5 && v.position.x < 2.0 + 1e-5);
            assert!(v.position.z > -1e-5 && v.position.z < 2.0 + 1e-5);
        }
        assert!(idx.iter().all(|&i| (5..21).contains(&i)));
    }

    #[test]
    fn corners_hit_control_points() {
        let controls = flat_controls();
        let mut verts = Vec::new();
        let mut idx = Vec::new();
        tessellate(&controls, 4, &mut verts, &mut idx);
        assert_eq!(verts.len(), 25);
        assert_eq!(verts[0].position, controls[0].position);
        assert_eq!(verts[4].position, controls[6].position);
        assert_eq!(verts[20].position, controls[2].position);
        assert_eq!(verts[24].position, controls[8].position);
    }

    #[test]
    fn control_block_strides_rows() {
        let grid: Vec<Vertex> = (0..15)
            .map(|i| Vertex {
                position: Vec3::splat(i as f32),
                ..Default::default()
            })
            .collect();
        // 5 wide, block at column 2 of row 0
        let block = control_block(&grid, 2, 5);
        let xs: Vec<f32> = block.iter().map(|v| v.position.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0, 7.0, 8.0, 9.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn sub_patch_count() {
        assert_eq!(sub_patch_counts([3, 3]), (1, 1));
        assert_eq!(sub_patch_counts([5, 3]), (2, 1));
        assert_eq!(sub_patch_counts([7, 9]), (3, 4));
        assert_eq!(sub_patch_counts([2, 3]), (0, 1));
    }
}
