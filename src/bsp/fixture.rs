//! Synthetic maps for tests: an IBSP byte writer with a small sample level,
//! and an in-memory level built from axis-aligned brushes.

use glam::Vec3;

use crate::bsp::raw::{HEADER_SIZE, Lump, MAGIC, VERSION};
use crate::world::geometry::{
    Aabb, Brush, BrushSide, ContentFlags, Leaf, Level, Node, NodeRef, Plane, Span, SurfaceFlags, TextureInfo,
};
use crate::world::texture::LIGHTMAP_BYTES;
use crate::world::vis::VisData;

/*=======================================================================*/
/*                           Byte-level writer                           */
/*=======================================================================*/

/// Little-endian record builder.
#[derive(Default)]
struct Rec(Vec<u8>);

impl Rec {
    fn i32s(mut self, vals: &[i32]) -> Self {
        for v in vals {
            self.0.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    fn f32s(mut self, vals: &[f32]) -> Self {
        for v in vals {
            self.0.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    fn bytes(mut self, b: &[u8]) -> Self {
        self.0.extend_from_slice(b);
        self
    }

    fn name(self, s: &str) -> Self {
        let mut n = [0u8; 64];
        n[..s.len()].copy_from_slice(s.as_bytes());
        self.bytes(&n)
    }
}

/// Collects lump payloads and lays them out after the header.
#[derive(Default)]
pub struct BspWriter {
    lumps: [Vec<u8>; Lump::COUNT],
}

impl BspWriter {
    pub fn set(&mut self, lump: Lump, bytes: Vec<u8>) {
        self.lumps[lump as usize] = bytes;
    }

    fn push(&mut self, lump: Lump, rec: Rec) {
        self.lumps[lump as usize].extend(rec.0);
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());

        let mut offset = HEADER_SIZE;
        for l in &self.lumps {
            out.extend_from_slice(&(offset as i32).to_le_bytes());
            out.extend_from_slice(&(l.len() as i32).to_le_bytes());
            offset += l.len();
        }
        for l in self.lumps {
            out.extend(l);
        }
        out
    }

    /// Two-leaf map split at file x = 0.
    ///
    /// * leaf 0 (x ≥ 0, cluster 0) holds a solid brush spanning file
    ///   x ∈ [32, 64], y, z ∈ [-64, 64], and faces 0 and 1;
    /// * leaf 1 (x < 0, cluster 1) holds face 0;
    /// * face 0 is a flat 3×3 patch on file z = 0, face 1 a quad at z = 16;
    /// * cluster 0 sees only itself, cluster 1 sees both.
    pub fn from_sample() -> Self {
        let mut w = BspWriter::default();

        w.set(
            Lump::Entities,
            concat!(
                "{\n\"classname\" \"worldspawn\"\n}\n",
                "{\n\"classname\" \"info_player_deathmatch\"\n\"origin\" \"16 32 64\"\n}\n\0"
            )
            .as_bytes()
            .to_vec(),
        );

        w.push(Lump::Textures, Rec::default().name("textures/base/wall").i32s(&[0, 1]));
        w.push(Lump::Textures, Rec::default().name("textures/liquids/water").i32s(&[0, 0x20]));

        // 0: splitter, 1..=6: brush sides
        for (n, d) in [
            ([1.0, 0.0, 0.0], 0.0),
            ([1.0, 0.0, 0.0], 64.0),
            ([-1.0, 0.0, 0.0], -32.0),
            ([0.0, 1.0, 0.0], 64.0),
            ([0.0, -1.0, 0.0], 64.0),
            ([0.0, 0.0, 1.0], 64.0),
            ([0.0, 0.0, -1.0], 64.0),
        ] {
            w.push(Lump::Planes, Rec::default().f32s(&n).f32s(&[d]));
        }

        w.push(
            Lump::Nodes,
            Rec::default().i32s(&[0, -1, -2]).i32s(&[-128; 3]).i32s(&[128; 3]),
        );

        w.push(
            Lump::Leafs,
            Rec::default()
                .i32s(&[0, 0])
                .i32s(&[0, -128, -128])
                .i32s(&[128, 128, 128])
                .i32s(&[0, 2, 0, 1]),
        );
        w.push(
            Lump::Leafs,
            Rec::default()
                .i32s(&[1, 0])
                .i32s(&[-128, -128, -128])
                .i32s(&[0, 128, 128])
                .i32s(&[2, 1, 1, 0]),
        );
        w.push(Lump::LeafFaces, Rec::default().i32s(&[0, 1, 0]));
        w.push(Lump::LeafBrushes, Rec::default().i32s(&[0]));

        w.push(
            Lump::Models,
            Rec::default()
                .f32s(&[-128.0; 3])
                .f32s(&[128.0; 3])
                .i32s(&[0, 2, 0, 1]),
        );

        w.push(Lump::Brushes, Rec::default().i32s(&[0, 6, 0]));
        for plane in 1..=6 {
            w.push(Lump::BrushSides, Rec::default().i32s(&[plane, 0]));
        }

        let vertex = |p: [f32; 3]| {
            Rec::default()
                .f32s(&p)
                .f32s(&[p[0] / 64.0, p[1] / 64.0])
                .f32s(&[0.0, 0.0])
                .f32s(&[0.0, 0.0, 1.0])
                .bytes(&[255, 255, 255, 255])
        };
        for r in 0..3 {
            for k in 0..3 {
                w.push(Lump::Vertices, vertex([k as f32 * 8.0, r as f32 * 8.0, 0.0]));
            }
        }
        for p in [[0.0, 0.0, 16.0], [16.0, 0.0, 16.0], [16.0, 16.0, 16.0], [0.0, 16.0, 16.0]] {
            w.push(Lump::Vertices, vertex(p));
        }
        w.push(Lump::Indices, Rec::default().i32s(&[0, 1, 2, 0, 2, 3]));

        w.push(Lump::Effects, Rec::default().name("textures/sfx/fog").i32s(&[-1, 0]));

        let face = |texture: i32, kind: i32, verts: [i32; 2], idx: [i32; 2], lightmap: i32, size: [i32; 2]| {
            Rec::default()
                .i32s(&[texture, -1, kind, verts[0], verts[1], idx[0], idx[1], lightmap])
                .i32s(&[0, 0, 128, 128])
                .f32s(&[0.0; 3])
                .f32s(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
                .f32s(&[0.0, 0.0, 1.0])
                .i32s(&size)
        };
        w.push(Lump::Faces, face(0, 2, [0, 9], [0, 0], 0, [3, 3]));
        w.push(Lump::Faces, face(1, 1, [9, 4], [0, 6], -1, [0, 0]));

        w.set(Lump::Lightmaps, vec![40; LIGHTMAP_BYTES]);
        w.push(Lump::LightVolumes, Rec::default().bytes(&[1, 2, 3, 4, 5, 6, 7, 8]));
        w.push(Lump::VisData, Rec::default().i32s(&[2, 1]).bytes(&[0b01, 0b11]));

        w
    }
}

/// Byte image of [`BspWriter::from_sample`].
pub fn sample_bsp() -> Vec<u8> {
    BspWriter::from_sample().finish()
}

/*=======================================================================*/
/*                        In-memory brush levels                         */
/*=======================================================================*/

/// Six axis-aligned sides of `b` appended as one brush.
fn push_box(planes: &mut Vec<Plane>, brush_sides: &mut Vec<BrushSide>, brushes: &mut Vec<Brush>, b: &Aabb, texture: usize) {
    let first = brush_sides.len();
    for (normal, dist) in [
        (Vec3::X, b.max.x),
        (Vec3::NEG_X, -b.min.x),
        (Vec3::Y, b.max.y),
        (Vec3::NEG_Y, -b.min.y),
        (Vec3::Z, b.max.z),
        (Vec3::NEG_Z, -b.min.z),
    ] {
        brush_sides.push(BrushSide {
            plane: planes.len(),
            texture: texture as i32,
        });
        planes.push(Plane { normal, dist });
    }
    brushes.push(Brush {
        sides: Span::new(first, 6),
        texture,
    });
}

fn brush_textures() -> Vec<TextureInfo> {
    vec![
        TextureInfo {
            name: "solid".into(),
            surface: SurfaceFlags::empty(),
            contents: ContentFlags::SOLID,
        },
        TextureInfo {
            name: "water".into(),
            surface: SurfaceFlags::empty(),
            contents: ContentFlags::WATER,
        },
    ]
}

fn brush_leaf(cluster: i32, brushes: Span) -> Leaf {
    Leaf {
        cluster,
        area: 0,
        bounds: Aabb::default(),
        faces: Span::default(),
        brushes,
    }
}

/// One-leaf level whose only leaf holds a brush per box.  `solid` boxes use
/// a `SOLID` texture, `passable` ones a water texture.
pub fn brush_level(solid: &[Aabb], passable: &[Aabb]) -> Level {
    let mut planes = vec![Plane {
        normal: Vec3::Y,
        dist: -1.0e4,
    }];
    let mut brush_sides = Vec::new();
    let mut brushes = Vec::new();

    let boxes = solid.iter().map(|b| (b, 0)).chain(passable.iter().map(|b| (b, 1)));
    for (b, texture) in boxes {
        push_box(&mut planes, &mut brush_sides, &mut brushes, b, texture);
    }

    Level {
        name: "brushes".into(),
        textures: brush_textures(),
        planes,
        nodes: vec![Node {
            plane: 0,
            children: [NodeRef::Leaf(0), NodeRef::Leaf(0)],
            bounds: Aabb::default(),
        }],
        leaves: vec![brush_leaf(0, Span::new(0, brushes.len()))],
        leaf_brushes: (0..brushes.len() as u32).collect(),
        brushes,
        brush_sides,
        vis: VisData::default(),
        ..Default::default()
    }
}

/// Two-leaf level split at x = 0.  Leaf 0 (x ≥ 0) holds the `front` solid
/// boxes, leaf 1 (x < 0) the `back` ones; each brush is listed only in the
/// leaf it was given for.
pub fn split_level(front: &[Aabb], back: &[Aabb]) -> Level {
    let mut planes = vec![Plane {
        normal: Vec3::X,
        dist: 0.0,
    }];
    let mut brush_sides = Vec::new();
    let mut brushes = Vec::new();

    for b in front.iter().chain(back) {
        push_box(&mut planes, &mut brush_sides, &mut brushes, b, 0);
    }

    Level {
        name: "split".into(),
        textures: brush_textures(),
        planes,
        nodes: vec![Node {
            plane: 0,
            children: [NodeRef::Leaf(0), NodeRef::Leaf(1)],
            bounds: Aabb::default(),
        }],
        leaves: vec![
            brush_leaf(0, Span::new(0, front.len())),
            brush_leaf(1, Span::new(front.len(), back.len())),
        ],
        leaf_brushes: (0..brushes.len() as u32).collect(),
        brushes,
        brush_sides,
        vis: VisData::default(),
        ..Default::default()
    }
}
