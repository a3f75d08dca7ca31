use crate::bsp::raw::{BspError, BspFile, Lump};
use crate::world::texture::LIGHTMAP_BYTES;
use bincode::Decode;
use byteorder::{LittleEndian as LE, ReadBytesExt};

/*=======================================================================*/
/*                         Raw binary structs                            */
/*=======================================================================*/

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug)]
pub struct RawTexture {
    pub name: [u8; 64],
    pub flags: i32,
    pub contents: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug)]
pub struct RawPlane {
    pub normal: [f32; 3],
    pub dist: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug)]
pub struct RawNode {
    pub plane: i32,
    pub children: [i32; 2],
    pub mins: [i32; 3],
    pub maxs: [i32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug)]
pub struct RawLeaf {
    pub cluster: i32,
    pub area: i32,
    pub mins: [i32; 3],
    pub maxs: [i32; 3],
    pub first_face: i32,
    pub face_count: i32,
    pub first_brush: i32,
    pub brush_count: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug)]
pub struct RawModel {
    pub mins: [f32; 3],
    pub maxs: [f32; 3],
    pub first_face: i32,
    pub face_count: i32,
    pub first_brush: i32,
    pub brush_count: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug)]
pub struct RawBrush {
    pub first_side: i32,
    pub side_count: i32,
    pub texture: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug)]
pub struct RawBrushSide {
    pub plane: i32,
    pub texture: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug)]
pub struct RawVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub lightmap_coord: [f32; 2],
    pub normal: [f32; 3],
    pub color: [u8; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug)]
pub struct RawEffect {
    pub name: [u8; 64],
    pub brush: i32,
    pub unknown: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug)]
pub struct RawFace {
    pub texture: i32,
    pub effect: i32,
    pub kind: i32,
    pub first_vertex: i32,
    pub vertex_count: i32,
    pub first_index: i32,
    pub index_count: i32,
    pub lightmap: i32,
    pub lightmap_corner: [i32; 2],
    pub lightmap_size: [i32; 2],
    pub lightmap_origin: [f32; 3],
    pub lightmap_vecs: [[f32; 3]; 2],
    pub normal: [f32; 3],
    pub patch_size: [i32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Decode, Debug)]
pub struct RawLightVolume {
    pub ambient: [u8; 3],
    pub directional: [u8; 3],
    pub dir: [u8; 2],
}

/// Header + bitsets of the `VisData` lump.
#[derive(Debug, Default)]
pub struct RawVisData {
    pub clusters: i32,
    pub bytes_per_cluster: i32,
    pub bitsets: Vec<u8>,
}

/*=======================================================================*/
/*                     Aggregate returned by `parse_level`               */
/*=======================================================================*/
#[derive(Debug)]
pub struct RawLevel {
    pub entities: String,
    pub textures: Vec<RawTexture>,
    pub planes: Vec<RawPlane>,
    pub nodes: Vec<RawNode>,
    pub leaves: Vec<RawLeaf>,
    pub leaf_faces: Vec<i32>,
    pub leaf_brushes: Vec<i32>,
    pub models: Vec<RawModel>,
    pub brushes: Vec<RawBrush>,
    pub brush_sides: Vec<RawBrushSide>,
    pub vertices: Vec<RawVertex>,
    pub indices: Vec<i32>,
    pub effects: Vec<RawEffect>,
    pub faces: Vec<RawFace>,
    /// one `LIGHTMAP_BYTES` RGB block per lightmap, not yet gamma corrected
    pub lightmaps: Vec<Vec<u8>>,
    pub light_volumes: Vec<RawLightVolume>,
    pub vis: RawVisData,
}

/// Return &str view of a NUL-padded name field (trimmed at first NUL).
pub fn name_str(name: &[u8]) -> &str {
    let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
    std::str::from_utf8(&name[..end]).unwrap_or("?")
}

/*=======================================================================*/
/*                   Convenience helpers on `BspFile`                    */
/*=======================================================================*/
impl BspFile {
    /// Decode all 17 lumps into their raw record types.
    pub fn parse_level(&self) -> Result<RawLevel, BspError> {
        let entities = String::from_utf8_lossy(self.lump_bytes(Lump::Entities))
            .trim_end_matches('\0')
            .to_owned();

        let lightmaps = self
            .lump_chunks(Lump::Lightmaps, LIGHTMAP_BYTES)?
            .map(<[u8]>::to_vec)
            .collect();

        Ok(RawLevel {
            entities,
            textures: self.lump_to_vec(Lump::Textures)?,
            planes: self.lump_to_vec(Lump::Planes)?,
            nodes: self.lump_to_vec(Lump::Nodes)?,
            leaves: self.lump_to_vec(Lump::Leafs)?,
            leaf_faces: self.lump_to_vec(Lump::LeafFaces)?,
            leaf_brushes: self.lump_to_vec(Lump::LeafBrushes)?,
            models: self.lump_to_vec(Lump::Models)?,
            brushes: self.lump_to_vec(Lump::Brushes)?,
            brush_sides: self.lump_to_vec(Lump::BrushSides)?,
            vertices: self.lump_to_vec(Lump::Vertices)?,
            indices: self.lump_to_vec(Lump::Indices)?,
            effects: self.lump_to_vec(Lump::Effects)?,
            faces: self.lump_to_vec(Lump::Faces)?,
            lightmaps,
            light_volumes: self.lump_to_vec(Lump::LightVolumes)?,
            vis: self.parse_vis()?,
        })
    }

    /// `VisData` is a two-int header followed by the bitsets.  A lump too
    /// short for the header means the map carries no PVS.
    fn parse_vis(&self) -> Result<RawVisData, BspError> {
        let mut cur = self.lump_bytes(Lump::VisData);
        if cur.len() < 8 {
            return Ok(RawVisData::default());
        }
        let clusters = cur.read_i32::<LE>()?;
        let bytes_per_cluster = cur.read_i32::<LE>()?;

        let wanted = clusters as i64 * bytes_per_cluster as i64;
        if clusters < 0 || bytes_per_cluster < 0 || wanted > cur.len() as i64 {
            return Err(BspError::BadVisData {
                clusters,
                bytes_per_cluster,
                available: cur.len(),
            });
        }

        Ok(RawVisData {
            clusters,
            bytes_per_cluster,
            bitsets: cur[..wanted as usize].to_vec(),
        })
    }
}

/*=======================================================================*/
/*                                Tests                                  */
/*=======================================================================*/
