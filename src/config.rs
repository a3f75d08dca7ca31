//! Load-time options for a level.

use std::path::{Path, PathBuf};

use crate::world::patch::BEZIER_LEVEL;

pub const DEFAULT_ROOT: &str = "data";
pub const DEFAULT_MAP: &str = "q3dm1";
/// Lightmap brightening factor.
pub const DEFAULT_GAMMA: f32 = 3.0;

#[derive(Clone, Debug, PartialEq)]
pub struct LevelConfig {
    /// Asset root; textures resolve to `<root>/<name>.{jpg,tga}`.
    pub root: PathBuf,
    /// Map name without directory or extension.
    pub map: String,
    pub gamma: f32,
    /// Subdivisions per edge of every Bezier sub-patch.
    pub bezier_level: usize,
    /// Issue texture load requests.
    pub textures: bool,
    /// Issue lightmap load requests.
    pub lightmaps: bool,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            map: DEFAULT_MAP.to_owned(),
            gamma: DEFAULT_GAMMA,
            bezier_level: BEZIER_LEVEL,
            textures: true,
            lightmaps: true,
        }
    }
}

impl LevelConfig {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_map(mut self, map: impl Into<String>) -> Self {
        self.map = map.into();
        self
    }

    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Clamped to at least 1.
    pub fn with_bezier_level(mut self, level: usize) -> Self {
        self.bezier_level = level.max(1);
        self
    }

    pub fn with_textures(mut self, on: bool) -> Self {
        self.textures = on;
        self
    }

    pub fn with_lightmaps(mut self, on: bool) -> Self {
        self.lightmaps = on;
        self
    }

    /// `<root>/maps/<map>.bsp`
    pub fn map_path(&self) -> PathBuf {
        self.root.join("maps").join(format!("{}.bsp", self.map))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = LevelConfig::default();
        assert_eq!(cfg.map_path(), Path::new("data/maps/q3dm1.bsp"));
        assert_eq!(cfg.gamma, 3.0);
        assert_eq!(cfg.bezier_level, 3);
        assert!(cfg.textures && cfg.lightmaps);
    }

    #[test]
    fn builder_overrides() {
        let cfg = LevelConfig::default()
            .with_root("/srv/q3")
            .with_map("q3tourney2")
            .with_bezier_level(0)
            .with_lightmaps(false);
        assert_eq!(cfg.map_path(), Path::new("/srv/q3/maps/q3tourney2.bsp"));
        assert_eq!(cfg.bezier_level, 1);
        assert!(!cfg.lightmaps);
    }
}
