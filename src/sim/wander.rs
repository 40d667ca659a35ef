//! Wander AI for the jelly avatar
//!
//! Steers the whole mesh toward a randomly chosen horizontal velocity, hops
//! on a timer, turns around at walls and springs back up after a hard
//! landing. It acts on node velocities directly, so the result does not
//! depend on node mass.

use glam::Vec2;
use rand::Rng;

use super::mesh::SoftMesh;
use super::world::{CollisionEvent, SpringWorld, Surface};
use crate::tuning::WanderTuning;

#[derive(Debug, Clone)]
pub struct Wander {
    pub tuning: WanderTuning,
    target_vx: f32,
    retarget_in: f32,
    jump_in: f32,
}

fn between<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}

impl Wander {
    pub fn new<R: Rng + ?Sized>(tuning: WanderTuning, rng: &mut R) -> Self {
        let mut wander = Self {
            target_vx: 0.0,
            retarget_in: 0.0,
            jump_in: 0.0,
            tuning,
        };
        wander.retarget(rng);
        wander.jump_in = between(rng, wander.tuning.jump_min, wander.tuning.jump_max);
        wander
    }

    pub fn target_vx(&self) -> f32 {
        self.target_vx
    }

    pub fn set_target_vx(&mut self, vx: f32) {
        let max = self.tuning.max_vx;
        self.target_vx = vx.clamp(-max, max);
    }

    fn retarget<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let max = self.tuning.max_vx;
        self.target_vx = between(rng, -max, max);
        self.retarget_in = between(rng, self.tuning.retarget_min, self.tuning.retarget_max);
    }

    /// Steering and timed jumps, before the world step
    pub fn pre_step<R: Rng + ?Sized>(
        &mut self,
        world: &mut SpringWorld,
        mesh: &SoftMesh,
        dt: f32,
        rng: &mut R,
    ) {
        if !self.tuning.enabled || mesh.nodes().is_empty() {
            return;
        }

        self.retarget_in -= dt;
        if self.retarget_in <= 0.0 {
            self.retarget(rng);
        }

        let avg = mesh.average_velocity(world).x;
        if avg.abs() > self.tuning.max_vx * self.tuning.overspeed_factor {
            let decay = self.tuning.overspeed_decay;
            Self::each_velocity(world, mesh, |v| Vec2::new(v.x * decay, v.y));
        } else {
            let max = self.tuning.max_accel;
            let accel = (self.tuning.gain * (self.target_vx - avg)).clamp(-max, max);
            Self::each_velocity(world, mesh, |v| Vec2::new(v.x + accel * dt, v.y));
        }

        self.jump_in -= dt;
        if self.jump_in <= 0.0 {
            let vy = -between(rng, self.tuning.jump_v_min, self.tuning.jump_v_max);
            let kick = between(rng, -self.tuning.side_kick, self.tuning.side_kick);
            Self::each_velocity(world, mesh, |v| Vec2::new(v.x + kick, vy));
            self.jump_in = between(rng, self.tuning.jump_min, self.tuning.jump_max);
            log::debug!("Wander jump: vy {:.0}, side kick {:.0}", vy, kick);
        }
    }

    /// React to the contacts of the last world step. Returns true when a
    /// hard landing bounced the mesh back up.
    pub fn post_step<R: Rng + ?Sized>(
        &mut self,
        world: &mut SpringWorld,
        mesh: &SoftMesh,
        events: &[CollisionEvent],
        rng: &mut R,
    ) -> bool {
        if !self.tuning.enabled || mesh.nodes().is_empty() {
            return false;
        }

        let mut blocked = false;
        // Strongest floor approach speed; node velocities are already
        // resolved by the time the events arrive
        let mut impact: Option<f32> = None;
        for event in events.iter().filter(|e| mesh.contains(e.node)) {
            match event.surface {
                Surface::LeftWall | Surface::RightWall | Surface::Collider(_) => blocked = true,
                Surface::Floor => impact = Some(impact.map_or(event.speed, |s| s.max(event.speed))),
                _ => {}
            }
        }

        if blocked {
            self.flip(mesh.average_velocity(world).x);
        }

        match impact {
            Some(speed) if speed > self.tuning.bounce_threshold => {
                let vy = -speed * self.tuning.bounce_scale;
                let side = self.tuning.bounce_side_kick;
                let kick = between(rng, -side, side);
                Self::each_velocity(world, mesh, |v| Vec2::new(v.x + kick, vy));
                log::debug!("Wander landing bounce: impact {:.0}, vy {:.0}", speed, vy);
                true
            }
            _ => false,
        }
    }

    /// Turn around; a standing target heads away from the current drift
    fn flip(&mut self, avg_vx: f32) {
        self.target_vx = if self.target_vx != 0.0 {
            -self.target_vx
        } else {
            -avg_vx.signum() * self.tuning.max_vx * 0.5
        };
    }

    fn each_velocity(world: &mut SpringWorld, mesh: &SoftMesh, f: impl Fn(Vec2) -> Vec2) {
        for &i in mesh.nodes() {
            if let Some(v) = world.node(i).map(|n| n.velocity) {
                world.set_velocity(i, f(v));
            }
        }
    }
}
