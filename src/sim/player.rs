use glam::Vec3;

use super::Collidable;

pub const SIM_FPS: u32 = 35;
pub const DT: f32 = 1.0 / SIM_FPS as f32;

pub const MOVE_SPEED: f32 = 320.0; // map-units / second
pub const TURN_RATE: f32 = std::f32::consts::PI; // rad / second (180°/s)
pub const GRAVITY: f32 = 800.0; // map-units / second²

/// Collision hull of the player, relative to its origin.
pub const PLAYER_MINS: Vec3 = Vec3::new(-15.0, -40.0, -15.0);
pub const PLAYER_MAXS: Vec3 = Vec3::new(15.0, 40.0, 15.0);

#[derive(Clone, Copy, Debug, Default)]
pub struct InputCmd {
    pub forward: f32, // –1 … +1
    pub strafe: f32,  // –1 … +1  (left / right)
    pub turn: f32,    // –1 … +1  (right / left)
}

/// A walking box driven one fixed tic at a time.
#[derive(Clone, Copy, Debug)]
pub struct Player {
    pub position: Vec3,
    pub velocity: Vec3,
    /// radians around +Y, 0 = +X
    pub yaw: f32,
    pub on_ground: bool,
}

impl Player {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            yaw,
            on_ground: false,
        }
    }

    /// Unit vector the player faces on the XZ plane.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        let (s, c) = self.yaw.sin_cos();
        Vec3::new(c, 0.0, s)
    }

    /// Unit vector to the player's right on the XZ plane.
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y)
    }

    /// Run one tic: turn, apply gravity, then move through `world`.
    pub fn tick(&mut self, cmd: InputCmd, world: &mut dyn Collidable) {
        self.yaw = (self.yaw + cmd.turn * TURN_RATE * DT).rem_euclid(std::f32::consts::TAU);

        let wish = (self.forward() * cmd.forward + self.right() * cmd.strafe) * MOVE_SPEED;
        self.velocity.x = wish.x;
        self.velocity.z = wish.z;
        self.velocity.y -= GRAVITY * DT;

        let target = self.position + self.velocity * DT;
        self.position = world.trace_box(self.position, target);

        self.on_ground = world.is_on_ground();
        if self.on_ground && self.velocity.y < 0.0 {
            self.velocity.y = 0.0;
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::fixture::brush_level;
    use crate::renderer::BspScene;
    use crate::world::geometry::Aabb;

    fn floor_scene() -> BspScene {
        let floor = Aabb::new(Vec3::new(-500.0, -20.0, -500.0), Vec3::new(500.0, 0.0, 500.0));
        BspScene::from_level(brush_level(&[floor], &[]))
    }

    #[test]
    fn falls_and_lands() {
        let mut scene = floor_scene();
        let mut p = Player::new(Vec3::new(0.0, 60.0, 0.0), 0.0);
        for _ in 0..SIM_FPS {
            p.tick(InputCmd::default(), &mut scene);
        }
        assert!(p.on_ground);
        assert_eq!(p.velocity.y, 0.0);
        // hull bottom rests just above the floor
        assert!((p.position.y - 40.0).abs() < 0.1, "y = {}", p.position.y);
    }

    #[test]
    fn walks_forward_on_floor() {
        let mut scene = floor_scene();
        let mut p = Player::new(Vec3::new(0.0, 40.5, 0.0), 0.0);
        let cmd = InputCmd {
            forward: 1.0,
            ..Default::default()
        };
        for _ in 0..10 {
            p.tick(cmd, &mut scene);
        }
        assert!(p.on_ground);
        assert!(p.position.x > 80.0);
        assert!(p.position.z.abs() < 1e-3);
        assert!(p.position.y > 40.0);
    }

    #[test]
    fn right_is_perpendicular() {
        let p = Player::new(Vec3::ZERO, 0.7);
        assert!(p.forward().dot(p.right()).abs() < 1e-6);
        assert!(p.right().y.abs() < 1e-6);
    }
}
