//! # IBSP file reader
//!
//! * Reads the entire `.bsp` into RAM.
//! * Provides zero-copy access to the 17 lumps.
//! * Decodes fixed-size binary records into typed vectors with **bincode 2**.
//!
//! Only Quake 3 files (`IBSP`, version 0x2e) are accepted.

use bincode::{Decode, config, decode_from_slice};
use byteorder::{LittleEndian as LE, ReadBytesExt};
use std::{fmt, fs, io, mem, path::Path};
use thiserror::Error;

pub const MAGIC: [u8; 4] = *b"IBSP";
pub const VERSION: i32 = 0x2e;

/// Magic + version + 17 `(offset, length)` pairs.
pub const HEADER_SIZE: usize = 8 + Lump::COUNT * 8;

/// The lumps of a Quake 3 map, in directory order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lump {
    Entities,
    Textures,
    Planes,
    Nodes,
    Leafs,
    LeafFaces,
    LeafBrushes,
    Models,
    Brushes,
    BrushSides,
    Vertices,
    Indices,
    Effects,
    Faces,
    Lightmaps,
    LightVolumes,
    VisData,
}

impl Lump {
    pub const COUNT: usize = 17;

    pub const ALL: [Lump; Lump::COUNT] = [
        Lump::Entities,
        Lump::Textures,
        Lump::Planes,
        Lump::Nodes,
        Lump::Leafs,
        Lump::LeafFaces,
        Lump::LeafBrushes,
        Lump::Models,
        Lump::Brushes,
        Lump::BrushSides,
        Lump::Vertices,
        Lump::Indices,
        Lump::Effects,
        Lump::Faces,
        Lump::Lightmaps,
        Lump::LightVolumes,
        Lump::VisData,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Lump::Entities => "entities",
            Lump::Textures => "textures",
            Lump::Planes => "planes",
            Lump::Nodes => "nodes",
            Lump::Leafs => "leafs",
            Lump::LeafFaces => "leaf faces",
            Lump::LeafBrushes => "leaf brushes",
            Lump::Models => "models",
            Lump::Brushes => "brushes",
            Lump::BrushSides => "brush sides",
            Lump::Vertices => "vertices",
            Lump::Indices => "indices",
            Lump::Effects => "effects",
            Lump::Faces => "faces",
            Lump::Lightmaps => "lightmaps",
            Lump::LightVolumes => "light volumes",
            Lump::VisData => "vis data",
        }
    }
}

impl fmt::Display for Lump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry in the lump directory (8 bytes on disk).
#[derive(Clone, Copy, Debug, Default)]
pub struct LumpInfo {
    pub offset: u32,
    pub length: u32,
}

/// Loader / decoding errors.
#[derive(Error, Debug)]
pub enum BspError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("file is not an IBSP (magic {0:?})")]
    BadMagic([u8; 4]),

    #[error("unsupported BSP version {0:#x}")]
    BadVersion(i32),

    #[error("lump {lump} slice {offset}+{length} past EOF ({file_size})")]
    LumpOutOfBounds {
        lump: Lump,
        offset: i32,
        length: i32,
        file_size: usize,
    },

    #[error("lump {lump} size {size} not multiple of element {elem_size}")]
    BadLumpSize {
        lump: Lump,
        size: usize,
        elem_size: usize,
    },

    #[error("lump {lump} element {elem}: {source}")]
    BadRecord {
        lump: Lump,
        elem: usize,
        source: bincode::error::DecodeError,
    },

    #[error("vis data declares {clusters}×{bytes_per_cluster} bytes, lump holds {available}")]
    BadVisData {
        clusters: i32,
        bytes_per_cluster: i32,
        available: usize,
    },
}

/// Entire BSP in memory (raw bytes + parsed directory).
#[derive(Debug)]
pub struct BspFile {
    lumps: [LumpInfo; Lump::COUNT],
    bytes: Vec<u8>,
}

impl BspFile {
    // ------------------------------------------------------------------ //
    // Low-level helpers
    // ------------------------------------------------------------------ //

    /// Raw bytes of `lump` (slice into `self.bytes`).
    pub fn lump_bytes(&self, lump: Lump) -> &[u8] {
        let l = self.lumps[lump as usize];
        let start = l.offset as usize;
        &self.bytes[start..start + l.length as usize]
    }

    /// Total file size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    // ------------------------------------------------------------------ //
    // Generic decode helper
    // ------------------------------------------------------------------ //

    /// Decode every record of `lump`.  An empty lump yields an empty vector;
    /// a length that is not a whole number of records is rejected.
    pub fn lump_to_vec<T>(&self, lump: Lump) -> Result<Vec<T>, BspError>
    where
        T: Decode<()>,
    {
        let bytes = self.lump_bytes(lump);
        let elem = mem::size_of::<T>();

        if bytes.len() % elem != 0 {
            return Err(BspError::BadLumpSize {
                lump,
                size: bytes.len(),
                elem_size: elem,
            });
        }

        let cfg = config::standard()
            .with_fixed_int_encoding()
            .with_little_endian();
        let mut out = Vec::with_capacity(bytes.len() / elem);
        let mut slice = bytes;

        while !slice.is_empty() {
            let (val, read) = decode_from_slice::<T, _>(slice, cfg).map_err(|e| BspError::BadRecord {
                lump,
                elem: out.len(),
                source: e,
            })?;
            out.push(val);
            slice = &slice[read..];
        }
        Ok(out)
    }

    /// Split `lump` into fixed-size byte records without decoding them.
    pub fn lump_chunks(&self, lump: Lump, elem: usize) -> Result<std::slice::ChunksExact<'_, u8>, BspError> {
        let bytes = self.lump_bytes(lump);
        if bytes.len() % elem != 0 {
            return Err(BspError::BadLumpSize {
                lump,
                size: bytes.len(),
                elem_size: elem,
            });
        }
        Ok(bytes.chunks_exact(elem))
    }

    // ------------------------------------------------------------------ //
    // Loading
    // ------------------------------------------------------------------ //

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BspError> {
        Self::from_bytes(fs::read(path)?)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, BspError> {
        let mut cur = bytes.as_slice();

        let mut magic = [0u8; 4];
        io::Read::read_exact(&mut cur, &mut magic)?;
        if magic != MAGIC {
            return Err(BspError::BadMagic(magic));
        }

        let version = cur.read_i32::<LE>()?;
        if version != VERSION {
            return Err(BspError::BadVersion(version));
        }

        // parse directory, validating each lump slice
        let mut lumps = [LumpInfo::default(); Lump::COUNT];
        for (info, lump) in lumps.iter_mut().zip(Lump::ALL) {
            let offset = cur.read_i32::<LE>()?;
            let length = cur.read_i32::<LE>()?;
            let end = offset as i64 + length as i64;
            if offset < 0 || length < 0 || end > bytes.len() as i64 {
                return Err(BspError::LumpOutOfBounds {
                    lump,
                    offset,
                    length,
                    file_size: bytes.len(),
                });
            }
            *info = LumpInfo {
                offset: offset as u32,
                length: length as u32,
            };
        }

        Ok(Self { lumps, bytes })
    }
}

// ==========================================================================
// Tests
// ==========================================================================
