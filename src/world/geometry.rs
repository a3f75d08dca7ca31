use bitflags::bitflags;
use glam::{Vec2, Vec3};
use std::ops::{Add, Mul, Range};

use crate::bsp::entities::Entity;
use crate::world::texture::TextureId;
use crate::world::vis::VisData;

pub type PlaneId = usize;
pub type LeafId = usize;
pub type FaceId = usize;
pub type BrushId = usize;

/// Runtime snapshot of one map (immutable after load).
#[derive(Debug, Default)]
pub struct Level {
    pub name: String,
    pub entities: Vec<Entity>,
    pub textures: Vec<TextureInfo>,
    pub planes: Vec<Plane>,
    pub nodes: Vec<Node>,
    pub leaves: Vec<Leaf>,
    pub leaf_faces: Vec<u32>,
    pub leaf_brushes: Vec<u32>,
    pub models: Vec<Model>,
    pub brushes: Vec<Brush>,
    pub brush_sides: Vec<BrushSide>,
    pub vertices: Vec<Vertex>,
    /// Absolute indices into `vertices`, three per triangle.
    pub indices: Vec<u32>,
    pub effects: Vec<Effect>,
    pub faces: Vec<Face>,
    pub light_volumes: Vec<LightVolume>,
    pub vis: VisData,
    /// texture record → handle issued by the texture sink
    pub texture_ids: Vec<TextureId>,
    /// lightmap record → handle issued by the texture sink
    pub lightmap_ids: Vec<TextureId>,
}

/// Converts a Z-up file vector into the engine's Y-up convention.
#[inline(always)]
pub fn y_up(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, -v.y)
}

/*------------------------- index windows ----------------------------*/

/// `(first, count)` window into one of the shared tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub first: u32,
    pub count: u32,
}

impl Span {
    pub fn new(first: usize, count: usize) -> Self {
        Self {
            first: first as u32,
            count: count as u32,
        }
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.first as usize..(self.first + self.count) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/*--------------------------- textures -------------------------------*/

bitflags! {
    /// Content bits of a texture record; decides what a brush *is*.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ContentFlags: u32 {
        const SOLID         = 0x0000_0001;
        const LAVA          = 0x0000_0008;
        const SLIME         = 0x0000_0010;
        const WATER         = 0x0000_0020;
        const FOG           = 0x0000_0040;
        const AREAPORTAL    = 0x0000_8000;
        const PLAYERCLIP    = 0x0001_0000;
        const MONSTERCLIP   = 0x0002_0000;
        const TELEPORTER    = 0x0004_0000;
        const JUMPPAD       = 0x0008_0000;
        const CLUSTERPORTAL = 0x0010_0000;
        const DONOTENTER    = 0x0020_0000;
        const ORIGIN        = 0x0100_0000;
        const BODY          = 0x0200_0000;
        const CORPSE        = 0x0400_0000;
        const DETAIL        = 0x0800_0000;
        const STRUCTURAL    = 0x1000_0000;
        const TRANSLUCENT   = 0x2000_0000;
        const TRIGGER       = 0x4000_0000;
        const NODROP        = 0x8000_0000;
    }
}

bitflags! {
    /// Surface bits of a texture record (rendering / footstep hints).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct SurfaceFlags: u32 {
        const NODAMAGE    = 0x0000_0001;
        const SLICK       = 0x0000_0002;
        const SKY         = 0x0000_0004;
        const LADDER      = 0x0000_0008;
        const NOIMPACT    = 0x0000_0010;
        const NOMARKS     = 0x0000_0020;
        const FLESH       = 0x0000_0040;
        const NODRAW      = 0x0000_0080;
        const HINT        = 0x0000_0100;
        const SKIP        = 0x0000_0200;
        const NOLIGHTMAP  = 0x0000_0400;
        const POINTLIGHT  = 0x0000_0800;
        const METALSTEPS  = 0x0000_1000;
        const NOSTEPS     = 0x0000_2000;
        const NONSOLID    = 0x0000_4000;
        const LIGHTFILTER = 0x0000_8000;
        const ALPHASHADOW = 0x0001_0000;
        const NODLIGHT    = 0x0002_0000;
        const DUST        = 0x0004_0000;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextureInfo {
    /// Path relative to the asset root, without extension.
    pub name: String,
    pub surface: SurfaceFlags,
    pub contents: ContentFlags,
}

impl TextureInfo {
    /// Brushes carrying this texture block movement.
    #[inline]
    pub fn is_solid(&self) -> bool {
        self.contents.contains(ContentFlags::SOLID)
    }
}

/*------------------------- tree primitives --------------------------*/

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f32,
}

impl Plane {
    /// Signed distance of `p`; positive in front.
    #[inline(always)]
    pub fn distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.dist
    }
}

/// Child reference of a node, decoded once at load.
///
/// On disk a child is a signed index: `>= 0` addresses the node table, a
/// negative value `v` addresses leaf `!v` (so `-1 → 0`, `-2 → 1`, …).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRef {
    Node(usize),
    Leaf(LeafId),
}

impl NodeRef {
    #[inline]
    pub fn from_raw(child: i32) -> Self {
        if child >= 0 {
            NodeRef::Node(child as usize)
        } else {
            NodeRef::Leaf(!child as usize)
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box spanned by two opposite corners in any order.
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub plane: PlaneId,
    /// `[front, back]`
    pub children: [NodeRef; 2],
    pub bounds: Aabb,
}

#[derive(Clone, Debug)]
pub struct Leaf {
    /// Visibility cluster, negative when the leaf is outside the map.
    pub cluster: i32,
    pub area: i32,
    pub bounds: Aabb,
    /// window into `Level::leaf_faces`
    pub faces: Span,
    /// window into `Level::leaf_brushes`
    pub brushes: Span,
}

#[derive(Clone, Debug)]
pub struct Model {
    pub bounds: Aabb,
    pub faces: Span,
    pub brushes: Span,
}

/*----------------------------- brushes ------------------------------*/

/// Convex solid: the intersection of the back half-spaces of its sides.
#[derive(Clone, Debug)]
pub struct Brush {
    pub sides: Span,
    pub texture: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct BrushSide {
    pub plane: PlaneId,
    pub texture: i32,
}

/*---------------------------- render data ---------------------------*/

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub tex_coord: Vec2,
    pub lightmap_coord: Vec2,
    pub normal: Vec3,
    pub color: [u8; 4],
}

impl Add for Vertex {
    type Output = Vertex;

    fn add(self, rhs: Vertex) -> Vertex {
        let mut color = self.color;
        for (c, r) in color.iter_mut().zip(rhs.color) {
            *c = c.saturating_add(r);
        }
        Vertex {
            position: self.position + rhs.position,
            tex_coord: self.tex_coord + rhs.tex_coord,
            lightmap_coord: self.lightmap_coord + rhs.lightmap_coord,
            normal: self.normal + rhs.normal,
            color,
        }
    }
}

impl Mul<f32> for Vertex {
    type Output = Vertex;

    fn mul(self, s: f32) -> Vertex {
        Vertex {
            position: self.position * s,
            tex_coord: self.tex_coord * s,
            lightmap_coord: self.lightmap_coord * s,
            normal: self.normal * s,
            color: self.color.map(|c| (c as f32 * s).round().clamp(0.0, 255.0) as u8),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceKind {
    Polygon,
    Patch,
    Mesh,
    Billboard,
    Other(i32),
}

impl FaceKind {
    pub fn from_raw(kind: i32) -> Self {
        match kind {
            1 => FaceKind::Polygon,
            2 => FaceKind::Patch,
            3 => FaceKind::Mesh,
            4 => FaceKind::Billboard,
            n => FaceKind::Other(n),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Face {
    pub texture: usize,
    pub effect: i32,
    pub kind: FaceKind,
    /// window into `Level::vertices`; for patches the tessellated grid
    pub vertices: Span,
    /// window into `Level::indices`
    pub indices: Span,
    pub lightmap: i32,
    pub lightmap_corner: [i32; 2],
    pub lightmap_size: [i32; 2],
    pub lightmap_origin: Vec3,
    pub lightmap_vecs: [Vec3; 2],
    pub normal: Vec3,
    /// control-point grid of a patch (`width`, `height`)
    pub patch_size: [i32; 2],
}

#[derive(Clone, Debug)]
pub struct Effect {
    pub name: String,
    pub brush: i32,
    pub unknown: i32,
}

#[derive(Clone, Copy, Debug)]
pub struct LightVolume {
    pub ambient: [u8; 3],
    pub directional: [u8; 3],
    /// spherical direction (phi, theta) in 1/256 turns
    pub dir: [u8; 2],
}
