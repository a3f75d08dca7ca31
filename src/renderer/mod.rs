//! Rendering boundary.
//!
//! *The engine never talks to a GPU.*  Each frame it picks the faces that
//! the PVS says may be seen from the camera and hands them, once each, to a
//! type that implements [`FaceRenderer`].
//!
//! * Any back-end (GL, wgpu, a counting stub) plugs in without touching the
//!   world or collision code.
//! * [`Scene`] is what a game loop holds; [`BspScene`] is the BSP-backed one
//!   and also offers collision through `sim::Collidable`.

use bit_vec::BitVec;
use glam::Vec3;

use crate::world::geometry::{Face, FaceId, Level, Vertex};
use crate::world::texture::{NO_TEXTURE, TextureId};

pub mod scene;

pub use scene::BspScene;

/// Which texture layers the back-end should bind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    pub textures: bool,
    pub lightmaps: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            textures: true,
            lightmaps: true,
        }
    }
}

/// Counters of the last rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub camera_leaf: usize,
    pub camera_cluster: i32,
    pub visible_leaves: usize,
    pub visible_faces: usize,
}

/// One face ready for the back-end.  `indices` are absolute into
/// `vertices`.
#[derive(Clone, Copy, Debug)]
pub struct FaceDraw<'a> {
    pub id: FaceId,
    pub face: &'a Face,
    pub vertices: &'a [Vertex],
    pub indices: &'a [u32],
    pub texture: TextureId,
    pub lightmap: Option<TextureId>,
}

/// Back-end receiving the draw set of a frame.
pub trait FaceRenderer {
    fn begin_frame(&mut self, _camera: Vec3) {}

    fn draw_face(&mut self, draw: &FaceDraw<'_>);

    fn end_frame(&mut self, _stats: &FrameStats) {}
}

/// Something that can draw itself from a camera position.
pub trait Scene {
    fn render(&mut self, camera: Vec3, out: &mut dyn FaceRenderer) -> FrameStats;
}

/// Per-frame "already emitted" set, one bit per face.
#[derive(Clone, Debug)]
pub struct DrawnFaces(BitVec);

impl DrawnFaces {
    pub fn new(faces: usize) -> Self {
        Self(BitVec::from_elem(faces, false))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Mark `face`; `false` if it was already marked this frame.
    #[inline]
    pub fn insert(&mut self, face: FaceId) -> bool {
        if self.0.get(face).unwrap_or(true) {
            return false;
        }
        self.0.set(face, true);
        true
    }

    pub fn contains(&self, face: FaceId) -> bool {
        self.0.get(face).unwrap_or(false)
    }
}

// ──────────────────────────────────────────────────────────────────────────
//                       Level – draw-set selection
// ──────────────────────────────────────────────────────────────────────────
impl Level {
    /// Faces potentially visible from `camera`, each once.
    ///
    /// Leaves, and the faces within each leaf, are scanned from last to
    /// first; a leaf is skipped when its cluster is not in the PVS of the
    /// camera's cluster.
    pub fn fill_visible_faces(&self, camera: Vec3, drawn: &mut DrawnFaces, faces: &mut Vec<FaceId>) -> FrameStats {
        faces.clear();
        drawn.clear();

        let camera_leaf = self.find_leaf(camera);
        let camera_cluster = self.leaves[camera_leaf].cluster;
        let mut stats = FrameStats {
            camera_leaf,
            camera_cluster,
            ..Default::default()
        };

        for (i, leaf) in self.leaves.iter().enumerate().rev() {
            if !self.is_cluster_visible(camera_cluster, leaf.cluster) {
                continue;
            }
            stats.visible_leaves += 1;
            for f in self.leaf_face_ids(i).rev() {
                if drawn.insert(f) {
                    faces.push(f);
                }
            }
        }

        stats.visible_faces = faces.len();
        stats
    }

    /// Build the back-end request for face `id`.
    pub fn face_draw(&self, id: FaceId, settings: RenderSettings) -> FaceDraw<'_> {
        let face = &self.faces[id];
        let texture = match settings.textures {
            true => self.texture_ids.get(face.texture).copied().unwrap_or(NO_TEXTURE),
            false => NO_TEXTURE,
        };
        let lightmap = usize::try_from(face.lightmap)
            .ok()
            .filter(|_| settings.lightmaps)
            .and_then(|i| self.lightmap_ids.get(i).copied());

        FaceDraw {
            id,
            face,
            vertices: &self.vertices,
            indices: &self.indices[face.indices.range()],
            texture,
            lightmap,
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
