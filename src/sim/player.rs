//! Free-roam player for the sandbox
//!
//! When the runner is not active the player box walks around the stage
//! under arrow-key forces and pushes the jelly through its hitbox.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::squash::{Squash, SquashProfile};
use crate::Aabb;
use crate::consts::{GROUND_HEIGHT, MAX_FRAME_DT, PLAYER_HEIGHT, PLAYER_WIDTH};
use crate::tuning::{PlayerTuning, friction_factor};

/// Held movement keys for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl MoveInput {
    fn axis(&self) -> f32 {
        f32::from(u8::from(self.right)) - f32::from(u8::from(self.left))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreePlayer {
    pub tuning: PlayerTuning,
    /// Box center
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: Vec2,
    pub on_ground: bool,
    pub squash: Squash,
}

impl FreePlayer {
    /// Standing on the ground, horizontally centered
    pub fn new(stage: Vec2, tuning: PlayerTuning) -> Self {
        let size = Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT);
        let floor = stage.y - GROUND_HEIGHT;
        Self {
            tuning,
            position: Vec2::new(stage.x / 2.0, floor - size.y / 2.0),
            velocity: Vec2::ZERO,
            size,
            on_ground: true,
            squash: Squash::default(),
        }
    }

    /// Advance by `dt` seconds inside a stage of the given size
    pub fn step(&mut self, input: &MoveInput, stage: Vec2, dt: f32) {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        let half = self.size / 2.0;
        let floor = stage.y - GROUND_HEIGHT;

        if input.jump && self.on_ground {
            self.velocity.y = self.tuning.jump_velocity;
            self.on_ground = false;
        }

        self.velocity.x += input.axis() * self.tuning.move_accel * dt;
        self.velocity.y += self.tuning.gravity * dt;
        self.velocity *= friction_factor(self.tuning.air_friction, dt);
        self.position += self.velocity * dt;

        let bottom = self.position.y + half.y;
        if bottom >= floor {
            if !self.on_ground {
                self.squash.land(self.velocity.y, &SquashProfile::FREE_ROAM);
            }
            self.position.y = floor - half.y;
            self.velocity.y = 0.0;
            self.on_ground = true;
        } else {
            // Small dips keep a standing player grounded; landing needs contact
            self.on_ground = self.on_ground
                && floor - bottom <= self.tuning.ground_tolerance
                && self.velocity.y >= 0.0;
        }

        let (left, right) = (half.x, (stage.x - half.x).max(half.x));
        if self.position.x < left || self.position.x > right {
            self.position.x = self.position.x.clamp(left, right);
            self.velocity.x = 0.0;
        }

        self.squash.update(self.velocity.y, &SquashProfile::FREE_ROAM);
    }

    /// Hitbox handed to the jelly scene
    pub fn collider_rect(&self) -> Aabb {
        Aabb::new(self.position, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAGE: Vec2 = Vec2::new(800.0, 600.0);
    const DT: f32 = 1.0 / 60.0;

    fn player() -> FreePlayer {
        FreePlayer::new(STAGE, PlayerTuning::default())
    }

    #[test]
    fn test_spawns_on_ground() {
        let p = player();
        assert_eq!(p.position, Vec2::new(400.0, 520.0));
        assert_eq!(p.collider_rect().max().y, 564.0);
        assert!(p.on_ground);
    }

    #[test]
    fn test_idle_stays_grounded() {
        let mut p = player();
        for _ in 0..60 {
            p.step(&MoveInput::default(), STAGE, DT);
        }
        assert!(p.on_ground);
        assert_eq!(p.position.y, 520.0);
    }

    #[test]
    fn test_arrow_moves_and_wall_stops() {
        let mut p = player();
        let right = MoveInput {
            right: true,
            ..Default::default()
        };
        p.step(&right, STAGE, DT);
        assert!(p.velocity.x > 0.0);
        for _ in 0..600 {
            p.step(&right, STAGE, DT);
        }
        assert_eq!(p.position.x, STAGE.x - 44.0);
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let mut p = player();
        let jump = MoveInput {
            jump: true,
            ..Default::default()
        };
        p.step(&jump, STAGE, DT);
        assert!(!p.on_ground);
        assert!(p.velocity.y < 0.0);
        let vy = p.velocity.y;
        p.step(&jump, STAGE, DT);
        assert!(p.velocity.y > vy, "no mid-air jump");

        for _ in 0..240 {
            p.step(&MoveInput::default(), STAGE, DT);
        }
        assert!(p.on_ground);
        assert!(p.collider_rect().max().y <= STAGE.y - GROUND_HEIGHT + 1e-3);
    }

    #[test]
    fn test_landing_squashes() {
        let mut p = player();
        p.position.y = 300.0;
        p.on_ground = false;
        for _ in 0..600 {
            p.step(&MoveInput::default(), STAGE, DT);
            if p.on_ground {
                break;
            }
        }
        assert!(p.on_ground);
        assert!(p.squash.land_pop > 0.0);
        assert!(p.squash.sx > 1.0);
    }
}
