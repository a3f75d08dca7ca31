mod collision;
mod player;

use glam::Vec3;

pub use collision::{GROUND_NORMAL_Y, M_EPS, MAX_SLIDE_DEPTH, MAX_STEP_HEIGHT, Trace, TraceShape};
pub use player::{DT, GRAVITY, InputCmd, MOVE_SPEED, PLAYER_MAXS, PLAYER_MINS, Player, SIM_FPS, TURN_RATE};

/// Something a moving body can be swept through.
///
/// The flags describe the most recent `trace_box` call; query them only
/// after tracing.
pub trait Collidable {
    /// Sweep the implementor's body hull from `start` to `end` and return
    /// the resolved position.
    fn trace_box(&mut self, start: Vec3, end: Vec3) -> Vec3;

    /// The last sweep ended resting on an upward-facing plane.
    fn is_on_ground(&self) -> bool;

    /// The last sweep was blocked.
    fn collided(&self) -> bool;
}
