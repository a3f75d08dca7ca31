use glam::Vec3;
use log::info;

use super::{DrawnFaces, FaceRenderer, FrameStats, RenderSettings, Scene};
use crate::bsp::LoadError;
use crate::config::LevelConfig;
use crate::sim::{Collidable, PLAYER_MAXS, PLAYER_MINS, Trace};
use crate::world::geometry::{FaceId, Level};
use crate::world::texture::TextureSink;

/// A loaded level together with its per-frame scratch state.
///
/// Rendering goes through [`Scene`]; player movement through
/// [`Collidable`], which sweeps the player hull.
pub struct BspScene {
    level: Level,
    drawn: DrawnFaces,
    faces: Vec<FaceId>,
    settings: RenderSettings,
    mins: Vec3,
    maxs: Vec3,
    last: Trace,
}

impl BspScene {
    /// Load the map named by `config`, uploading images through `sink`.
    pub fn open(config: &LevelConfig, sink: &mut dyn TextureSink) -> Result<Self, LoadError> {
        let level = Level::load(config, sink)?;
        info!(
            "scene '{}': {} faces, {} leaves, {} clusters",
            level.name,
            level.faces.len(),
            level.leaves.len(),
            level.vis.cluster_count()
        );
        Ok(Self::from_level(level))
    }

    pub fn from_level(level: Level) -> Self {
        Self {
            drawn: DrawnFaces::new(level.faces.len()),
            faces: Vec::with_capacity(level.faces.len()),
            level,
            settings: RenderSettings::default(),
            mins: PLAYER_MINS,
            maxs: PLAYER_MAXS,
            last: Trace::default(),
        }
    }

    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the hull used by [`Collidable::trace_box`].
    pub fn with_hull(mut self, mins: Vec3, maxs: Vec3) -> Self {
        self.mins = mins;
        self.maxs = maxs;
        self
    }

    #[inline]
    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn settings(&self) -> RenderSettings {
        self.settings
    }

    /// Result of the most recent hull sweep.
    pub fn last_trace(&self) -> &Trace {
        &self.last
    }
}

impl Scene for BspScene {
    fn render(&mut self, camera: Vec3, out: &mut dyn FaceRenderer) -> FrameStats {
        let stats = self
            .level
            .fill_visible_faces(camera, &mut self.drawn, &mut self.faces);

        out.begin_frame(camera);
        for &id in &self.faces {
            out.draw_face(&self.level.face_draw(id, self.settings));
        }
        out.end_frame(&stats);
        stats
    }
}

impl Collidable for BspScene {
    fn trace_box(&mut self, start: Vec3, end: Vec3) -> Vec3 {
        self.last = self.level.trace_box(start, end, self.mins, self.maxs);
        self.last.position
    }

    fn is_on_ground(&self) -> bool {
        self.last.grounded
    }

    fn collided(&self) -> bool {
        self.last.collided
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
