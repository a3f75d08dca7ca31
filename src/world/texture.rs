// Format-agnostic repository of textures and lightmaps requested by the
// level loader.  The renderer and world logic interact through `TextureId`
// only; GPU back-ends implement `TextureSink` themselves.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Runtime handle for a texture or lightmap issued by a `TextureSink`.
pub type TextureId = u32;

/// Handle used when a texture could not be loaded.
/// Always = 0 because `TextureBank::new()` inserts it first.
pub const NO_TEXTURE: TextureId = 0;

/// Lightmaps are always 128×128 RGB.
pub const LIGHTMAP_SIZE: usize = 128;
pub const LIGHTMAP_BYTES: usize = LIGHTMAP_SIZE * LIGHTMAP_SIZE * 3;

/// Extensions tried, in order, when resolving a texture name.
pub const TEXTURE_EXTENSIONS: [&str; 2] = ["jpg", "tga"];

/// Encoded image bytes (JPEG / TGA) as found under the asset root.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub name: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// One gamma-corrected RGB lightmap.
#[derive(Clone, Debug, PartialEq)]
pub struct Lightmap {
    pub pixels: Vec<u8>,
}

/// Things that can go wrong when loading into a sink.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// Neither `<name>.jpg` nor `<name>.tga` exists under the asset root.
    #[error("texture `{0}` not found")]
    NotFound(String),

    /// Attempted to insert a second texture with an existing name.
    #[error("texture name `{0}` already present in bank")]
    Duplicate(String),

    /// Requested ID is outside `0 .. bank.len()`.
    #[error("texture id {0} out of range")]
    BadId(TextureId),

    #[error("reading {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// Receiver for the one-per-record load requests the level loader issues.
pub trait TextureSink {
    /// `path` is `None` when no file with a known extension was found.
    fn load_texture(&mut self, name: &str, path: Option<&Path>) -> Result<TextureId, TextureError>;

    /// `lightmap` is already gamma corrected.
    fn load_lightmap(&mut self, lightmap: Lightmap) -> Result<TextureId, TextureError>;
}

/// Try `<root>/<name>.jpg`, then `<root>/<name>.tga`.
pub fn resolve_texture_path(root: &Path, name: &str) -> Option<PathBuf> {
    TEXTURE_EXTENSIONS
        .iter()
        .map(|ext| root.join(format!("{name}.{ext}")))
        .find(|p| p.is_file())
}

/// Brighten an RGB buffer in place by `factor`.
///
/// Every channel is scaled by `factor / 255`; if any channel of a pixel
/// overshoots 1.0 the whole pixel is scaled back so the brightest channel
/// lands on exactly 1.0, which keeps the hue.
pub fn apply_gamma(pixels: &mut [u8], factor: f32) {
    for px in pixels.chunks_exact_mut(3) {
        let rgb = [px[0], px[1], px[2]].map(|c| c as f32 * factor / 255.0);

        let mut scale = 1.0f32;
        for c in rgb {
            if c > 1.0 {
                scale = scale.min(1.0 / c);
            }
        }
        let scale = scale * 255.0;

        for (dst, c) in px.iter_mut().zip(rgb) {
            *dst = (c * scale) as u8;
        }
    }
}

/// CPU-side `TextureSink`.
///
/// * Stores exactly one copy of every name.
/// * ID **0** is always the “missing” placeholder.
/// * Lightmaps live in their own id space, starting at 0.
///
/// **Thread-safety:** access `TextureBank` from a single thread or wrap it
/// in `RwLock`.
pub struct TextureBank {
    by_name: HashMap<String, TextureId>,
    data: Vec<Texture>,
    lightmaps: Vec<Lightmap>,
}

impl Default for TextureBank {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureBank {
    // ---------------------------------------------------------------------
    // Constructors
    // ---------------------------------------------------------------------

    /// Create an empty bank holding only the placeholder under `"MISSING"`.
    pub fn new() -> Self {
        let mut by_name = HashMap::new();
        by_name.insert("MISSING".into(), NO_TEXTURE);
        Self {
            by_name,
            data: vec![Texture {
                name: "MISSING".into(),
                path: PathBuf::new(),
                bytes: Vec::new(),
            }],
            lightmaps: Vec::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Query helpers
    // ---------------------------------------------------------------------

    /// Number of textures stored (including the “missing” one).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.len() == 1
    } // only placeholder

    pub fn lightmap_count(&self) -> usize {
        self.lightmaps.len()
    }

    /// Obtain the id for a *loaded* texture by name.
    pub fn id(&self, name: &str) -> Option<TextureId> {
        self.by_name.get(name).copied()
    }

    /// Borrow a texture by id, with bounds-checking.
    pub fn texture(&self, id: TextureId) -> Result<&Texture, TextureError> {
        self.data.get(id as usize).ok_or(TextureError::BadId(id))
    }

    pub fn lightmap(&self, id: TextureId) -> Result<&Lightmap, TextureError> {
        self.lightmaps.get(id as usize).ok_or(TextureError::BadId(id))
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Insert a texture under its name; fails if the name already exists.
    pub fn insert(&mut self, tex: Texture) -> Result<TextureId, TextureError> {
        if self.by_name.contains_key(&tex.name) {
            return Err(TextureError::Duplicate(tex.name));
        }
        let id = self.data.len() as TextureId;
        self.by_name.insert(tex.name.clone(), id);
        self.data.push(tex);
        Ok(id)
    }
}

impl TextureSink for TextureBank {
    fn load_texture(&mut self, name: &str, path: Option<&Path>) -> Result<TextureId, TextureError> {
        if let Some(id) = self.id(name) {
            return Ok(id);
        }
        let path = path.ok_or_else(|| TextureError::NotFound(name.to_owned()))?;
        let bytes = fs::read(path).map_err(|source| TextureError::Io {
            path: path.to_owned(),
            source,
        })?;
        self.insert(Texture {
            name: name.to_owned(),
            path: path.to_owned(),
            bytes,
        })
    }

    fn load_lightmap(&mut self, lightmap: Lightmap) -> Result<TextureId, TextureError> {
        let id = self.lightmaps.len() as TextureId;
        self.lightmaps.push(lightmap);
        Ok(id)
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
