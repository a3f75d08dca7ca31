pub mod bsp;
pub mod geometry;
pub mod patch;
pub mod texture;
pub mod vis;

pub use geometry::{
    Aabb, Brush, BrushId, BrushSide, ContentFlags, Effect, Face, FaceId, FaceKind, Leaf, LeafId, Level, LightVolume,
    Model, Node, NodeRef, Plane, PlaneId, Span, SurfaceFlags, TextureInfo, Vertex, y_up,
};

pub use texture::{Lightmap, NO_TEXTURE, Texture, TextureBank, TextureError, TextureId, TextureSink};

pub use vis::VisData;
