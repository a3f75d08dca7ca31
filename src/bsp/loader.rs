// ──────────────────────────────────────────────────────────────────────────
// bsp/loader.rs
//
//  *   RawLevel   (bsp::level)           ──╮
//  *   LevelConfig (root, gamma, bezier)   │   --->  world::geometry::Level
//  *   TextureSink (mut)                   │          + textures / lightmaps
//                                          ╯           handed to the sink
// ──────────────────────────────────────────────────────────────────────────

use crate::{
    bsp::entities::parse_entities,
    bsp::level::{self as raw_level, RawLevel},
    bsp::raw::{BspError, BspFile},
    config::LevelConfig,
    world::{
        geometry as geo,
        patch,
        texture::{Lightmap, NO_TEXTURE, TextureId, TextureSink, apply_gamma, resolve_texture_path},
        vis::VisData,
    },
};
use log::{debug, info, warn};
use std::path::Path;
use thiserror::Error;

/*──────────────────────────── Error type ───────────────────────────*/

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Bsp(#[from] BspError),

    #[error("{table} reference {index} out of range (len {len})")]
    BadReference {
        table: &'static str,
        index: i64,
        len: usize,
    },

    #[error("level has no nodes or no leaves")]
    EmptyTree,
}

/*====================================================================*/
/*                       Public API                                   */
/*====================================================================*/

impl geo::Level {
    /// Load `config.map_path()`.
    pub fn load(config: &LevelConfig, sink: &mut dyn TextureSink) -> Result<Self, LoadError> {
        load_level_file(config.map_path(), config, sink)
    }
}

/// Read and convert the `.bsp` at `path`; the level is named after the file
/// stem.
pub fn load_level_file<P: AsRef<Path>>(
    path: P,
    config: &LevelConfig,
    sink: &mut dyn TextureSink,
) -> Result<geo::Level, LoadError> {
    let path = path.as_ref();
    info!("loading {}", path.display());
    let bsp = BspFile::from_file(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    load_level(&bsp, &name, config, sink)
}

/// Convert an opened BSP into a `world::Level`, issuing one texture request
/// per texture record and one lightmap request per lightmap.  Textures that
/// cannot be loaded are logged and mapped to `NO_TEXTURE`.
pub fn load_level(
    bsp: &BspFile,
    name: &str,
    config: &LevelConfig,
    sink: &mut dyn TextureSink,
) -> Result<geo::Level, LoadError> {
    /*----- 1. Raw lumps --------------------------------------------------*/
    let raw = bsp.parse_level()?;
    debug!(
        "{name}: {} nodes, {} leaves, {} brushes, {} faces, {} vertices",
        raw.nodes.len(),
        raw.leaves.len(),
        raw.brushes.len(),
        raw.faces.len(),
        raw.vertices.len()
    );
    if raw.nodes.is_empty() || raw.leaves.is_empty() {
        return Err(LoadError::EmptyTree);
    }

    /*----- 2. Convert raw → geo lists, validating references -------------*/
    use geo::*;

    let textures: Vec<TextureInfo> = raw.textures.iter().map(raw_to_geo::texture_from).collect();
    let planes: Vec<Plane> = raw.planes.iter().map(raw_to_geo::plane_from).collect();

    let nodes: Vec<Node> = raw
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| raw_to_geo::node_from(i, n, &raw))
        .collect::<Result<_, _>>()?;

    let leaves: Vec<Leaf> = raw
        .leaves
        .iter()
        .map(|l| raw_to_geo::leaf_from(l, &raw))
        .collect::<Result<_, _>>()?;

    let leaf_faces = raw_to_geo::index_table("leaf face", &raw.leaf_faces, raw.faces.len())?;
    let leaf_brushes = raw_to_geo::index_table("leaf brush", &raw.leaf_brushes, raw.brushes.len())?;

    let models: Vec<Model> = raw
        .models
        .iter()
        .map(|m| raw_to_geo::model_from(m, &raw))
        .collect::<Result<_, _>>()?;

    let brushes: Vec<Brush> = raw
        .brushes
        .iter()
        .map(|b| raw_to_geo::brush_from(b, &raw))
        .collect::<Result<_, _>>()?;

    let brush_sides: Vec<BrushSide> = raw
        .brush_sides
        .iter()
        .map(|s| raw_to_geo::brush_side_from(s, &raw))
        .collect::<Result<_, _>>()?;

    let effects: Vec<Effect> = raw.effects.iter().map(raw_to_geo::effect_from).collect();
    let light_volumes: Vec<LightVolume> = raw.light_volumes.iter().map(raw_to_geo::light_volume_from).collect();

    /*----- 3. Vertices, faces, patches and rebased indices ----------------*/
    let mut vertices: Vec<Vertex> = raw.vertices.iter().map(raw_to_geo::vertex_from).collect();
    let mut faces: Vec<Face> = raw
        .faces
        .iter()
        .map(|f| raw_to_geo::face_from(f, &raw))
        .collect::<Result<_, _>>()?;
    let indices = build_mesh(&raw, &mut faces, &mut vertices, config.bezier_level)?;

    /*----- 4. Texture / lightmap requests --------------------------------*/
    let texture_ids = if config.textures {
        load_textures(&textures, config.root(), sink)
    } else {
        vec![NO_TEXTURE; textures.len()]
    };
    let lightmap_ids = if config.lightmaps {
        load_lightmaps(raw.lightmaps, config.gamma, sink)
    } else {
        Vec::new()
    };

    /*----- 5. Assemble world::Level -------------------------------------*/
    let vis = VisData::new(
        raw.vis.clusters as usize,
        raw.vis.bytes_per_cluster as usize,
        raw.vis.bitsets,
    );
    info!(
        "{name}: {} faces, {} clusters, {} textures, {} lightmaps",
        faces.len(),
        vis.cluster_count(),
        texture_ids.iter().filter(|&&id| id != NO_TEXTURE).count(),
        lightmap_ids.len()
    );

    Ok(Level {
        name: name.to_owned(),
        entities: parse_entities(&raw.entities),
        textures,
        planes,
        nodes,
        leaves,
        leaf_faces,
        leaf_brushes,
        models,
        brushes,
        brush_sides,
        vertices,
        indices,
        effects,
        faces,
        light_volumes,
        vis,
        texture_ids,
        lightmap_ids,
    })
}

/*====================================================================*/
/*                  Raw → Geo helpers (local)                         */
/*====================================================================*/
mod raw_to_geo {
    use super::*;
    use glam::{Vec2, Vec3};

    /// `index` must address one of `len` records.
    pub fn check(table: &'static str, index: i32, len: usize) -> Result<usize, LoadError> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < len)
            .ok_or(LoadError::BadReference {
                table,
                index: index as i64,
                len,
            })
    }

    /// `first .. first + count` must lie within `len` records.
    pub fn window(table: &'static str, first: i32, count: i32, len: usize) -> Result<geo::Span, LoadError> {
        let end = first as i64 + count as i64;
        if first < 0 || count < 0 || end > len as i64 {
            return Err(LoadError::BadReference { table, index: end, len });
        }
        Ok(geo::Span::new(first as usize, count as usize))
    }

    pub fn index_table(table: &'static str, raw: &[i32], len: usize) -> Result<Vec<u32>, LoadError> {
        raw.iter().map(|&i| check(table, i, len).map(|i| i as u32)).collect()
    }

    #[inline]
    fn vec3(v: [f32; 3]) -> Vec3 {
        Vec3::from_array(v)
    }

    /// Integer box → Y-up box, re-ordered into min/max.
    fn bounds_i(mins: [i32; 3], maxs: [i32; 3]) -> geo::Aabb {
        bounds_f(mins.map(|c| c as f32), maxs.map(|c| c as f32))
    }

    fn bounds_f(mins: [f32; 3], maxs: [f32; 3]) -> geo::Aabb {
        geo::Aabb::from_corners(geo::y_up(vec3(mins)), geo::y_up(vec3(maxs)))
    }

    pub fn texture_from(r: &raw_level::RawTexture) -> geo::TextureInfo {
        geo::TextureInfo {
            name: raw_level::name_str(&r.name).to_owned(),
            surface: geo::SurfaceFlags::from_bits_retain(r.flags as u32),
            contents: geo::ContentFlags::from_bits_retain(r.contents as u32),
        }
    }

    pub fn plane_from(r: &raw_level::RawPlane) -> geo::Plane {
        geo::Plane {
            normal: geo::y_up(vec3(r.normal)),
            dist: r.dist,
        }
    }

    /// Child nodes must come after their parent, which keeps the tree
    /// acyclic.
    pub fn node_from(index: usize, r: &raw_level::RawNode, raw: &RawLevel) -> Result<geo::Node, LoadError> {
        let child = |c: i32| match geo::NodeRef::from_raw(c) {
            geo::NodeRef::Node(i) if i <= index => Err(LoadError::BadReference {
                table: "node child",
                index: i as i64,
                len: raw.nodes.len(),
            }),
            geo::NodeRef::Node(i) => check("node child", i as i32, raw.nodes.len()).map(geo::NodeRef::Node),
            geo::NodeRef::Leaf(i) => check("leaf child", i as i32, raw.leaves.len()).map(geo::NodeRef::Leaf),
        };
        Ok(geo::Node {
            plane: check("node plane", r.plane, raw.planes.len())?,
            children: [child(r.children[0])?, child(r.children[1])?],
            bounds: bounds_i(r.mins, r.maxs),
        })
    }

    pub fn leaf_from(r: &raw_level::RawLeaf, raw: &RawLevel) -> Result<geo::Leaf, LoadError> {
        Ok(geo::Leaf {
            cluster: r.cluster,
            area: r.area,
            bounds: bounds_i(r.mins, r.maxs),
            faces: window("leaf faces", r.first_face, r.face_count, raw.leaf_faces.len())?,
            brushes: window("leaf brushes", r.first_brush, r.brush_count, raw.leaf_brushes.len())?,
        })
    }

    pub fn model_from(r: &raw_level::RawModel, raw: &RawLevel) -> Result<geo::Model, LoadError> {
        Ok(geo::Model {
            bounds: bounds_f(r.mins, r.maxs),
            faces: window("model faces", r.first_face, r.face_count, raw.faces.len())?,
            brushes: window("model brushes", r.first_brush, r.brush_count, raw.brushes.len())?,
        })
    }

    pub fn brush_from(r: &raw_level::RawBrush, raw: &RawLevel) -> Result<geo::Brush, LoadError> {
        Ok(geo::Brush {
            sides: window("brush sides", r.first_side, r.side_count, raw.brush_sides.len())?,
            texture: check("brush texture", r.texture, raw.textures.len())?,
        })
    }

    pub fn brush_side_from(r: &raw_level::RawBrushSide, raw: &RawLevel) -> Result<geo::BrushSide, LoadError> {
        Ok(geo::BrushSide {
            plane: check("brush side plane", r.plane, raw.planes.len())?,
            texture: r.texture,
        })
    }

    pub fn vertex_from(r: &raw_level::RawVertex) -> geo::Vertex {
        geo::Vertex {
            position: geo::y_up(vec3(r.position)),
            tex_coord: Vec2::from_array(r.tex_coord),
            lightmap_coord: Vec2::from_array(r.lightmap_coord),
            normal: geo::y_up(vec3(r.normal)),
            color: r.color,
        }
    }

    /// Vertex / index windows are validated here; `build_mesh` replaces
    /// them with windows into the final tables.
    pub fn face_from(r: &raw_level::RawFace, raw: &RawLevel) -> Result<geo::Face, LoadError> {
        let kind = geo::FaceKind::from_raw(r.kind);
        let vertices = window("face vertices", r.first_vertex, r.vertex_count, raw.vertices.len())?;
        let indices = window("face indices", r.first_index, r.index_count, raw.indices.len())?;
        if kind == geo::FaceKind::Patch {
            let controls = r.patch_size[0].max(0) as i64 * r.patch_size[1].max(0) as i64;
            if controls > r.vertex_count as i64 {
                return Err(LoadError::BadReference {
                    table: "patch control points",
                    index: controls,
                    len: r.vertex_count as usize,
                });
            }
        }
        Ok(geo::Face {
            texture: check("face texture", r.texture, raw.textures.len())?,
            effect: r.effect,
            kind,
            vertices,
            indices,
            lightmap: r.lightmap,
            lightmap_corner: r.lightmap_corner,
            lightmap_size: r.lightmap_size,
            lightmap_origin: geo::y_up(vec3(r.lightmap_origin)),
            lightmap_vecs: r.lightmap_vecs.map(|v| geo::y_up(vec3(v))),
            normal: geo::y_up(vec3(r.normal)),
            patch_size: r.patch_size,
        })
    }

    pub fn effect_from(r: &raw_level::RawEffect) -> geo::Effect {
        geo::Effect {
            name: raw_level::name_str(&r.name).to_owned(),
            brush: r.brush,
            unknown: r.unknown,
        }
    }

    pub fn light_volume_from(r: &raw_level::RawLightVolume) -> geo::LightVolume {
        geo::LightVolume {
            ambient: r.ambient,
            directional: r.directional,
            dir: r.dir,
        }
    }
}

/*====================================================================*/
/*                  Mesh / texture helpers                            */
/*====================================================================*/

/// Tessellate patch faces into new vertices appended past the raw ones and
/// copy every other face's indices rebased by its first vertex.  On return
/// each face's windows address the final `vertices` / index tables.
fn build_mesh(
    raw: &RawLevel,
    faces: &mut [geo::Face],
    vertices: &mut Vec<geo::Vertex>,
    bezier_level: usize,
) -> Result<Vec<u32>, LoadError> {
    let raw_vertex_count = vertices.len();
    let mut indices = Vec::with_capacity(raw.indices.len());
    let mut patches = 0usize;

    for face in faces.iter_mut() {
        let first_index = indices.len();

        if face.kind == geo::FaceKind::Patch {
            let first_vertex = vertices.len();
            let width = face.patch_size[0] as usize;
            let (dim_x, dim_y) = patch::sub_patch_counts(face.patch_size);
            let grid = face.vertices.range();

            for m in 0..dim_y {
                for n in 0..dim_x {
                    let controls = patch::control_block(&vertices[grid.clone()], 2 * n + width * 2 * m, width);
                    patch::tessellate(&controls, bezier_level, vertices, &mut indices);
                }
            }
            face.vertices = geo::Span::new(first_vertex, vertices.len() - first_vertex);
            patches += 1;
        } else {
            let base = face.vertices.first as i64;
            for &i in &raw.indices[face.indices.range()] {
                let abs = base + i as i64;
                if i < 0 || abs >= raw_vertex_count as i64 {
                    return Err(LoadError::BadReference {
                        table: "face index",
                        index: abs,
                        len: raw_vertex_count,
                    });
                }
                indices.push(abs as u32);
            }
        }

        face.indices = geo::Span::new(first_index, indices.len() - first_index);
    }

    debug!(
        "tessellated {patches} patches into {} vertices",
        vertices.len() - raw_vertex_count
    );
    Ok(indices)
}

fn load_textures(textures: &[geo::TextureInfo], root: &Path, sink: &mut dyn TextureSink) -> Vec<TextureId> {
    textures
        .iter()
        .map(|t| {
            let path = resolve_texture_path(root, &t.name);
            sink.load_texture(&t.name, path.as_deref()).unwrap_or_else(|e| {
                warn!("texture {}: {e}", t.name);
                NO_TEXTURE
            })
        })
        .collect()
}

fn load_lightmaps(lightmaps: Vec<Vec<u8>>, gamma: f32, sink: &mut dyn TextureSink) -> Vec<TextureId> {
    lightmaps
        .into_iter()
        .enumerate()
        .map(|(i, mut pixels)| {
            apply_gamma(&mut pixels, gamma);
            sink.load_lightmap(Lightmap { pixels }).unwrap_or_else(|e| {
                warn!("lightmap {i}: {e}");
                NO_TEXTURE
            })
        })
        .collect()
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
