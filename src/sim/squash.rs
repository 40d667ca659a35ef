//! Squash and stretch driven by vertical velocity
//!
//! Purely visual: the scale pair never feeds back into collisions.

use serde::{Deserialize, Serialize};

use crate::lerp;

/// Coefficients for one squash style
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquashProfile {
    /// Speed that maps to full deformation (px/s)
    pub speed_norm: f32,
    /// Cap on the normalized speed
    pub max_t: f32,
    /// (falling, rising) x-scale response
    pub sx_fall: f32,
    pub sx_rise: f32,
    /// (rising, falling) y-scale response
    pub sy_rise: f32,
    pub sy_fall: f32,
    /// Landing pop weights on x and y
    pub pop_sx: f32,
    pub pop_sy: f32,
    /// Impact speed that produces a pop of 1.0
    pub pop_norm: f32,
    pub pop_max: f32,
    /// Per-tick pop decay
    pub pop_decay: f32,
    /// Smoothing toward the target scale
    pub smoothing: f32,
}

impl SquashProfile {
    /// Runner: subtle, reads well at high scroll speeds
    pub const RUNNER: SquashProfile = SquashProfile {
        speed_norm: 600.0,
        max_t: 0.35,
        sx_fall: 0.22,
        sx_rise: -0.12,
        sy_rise: 0.35,
        sy_fall: -0.18,
        pop_sx: 0.6,
        pop_sy: 0.5,
        pop_norm: 600.0,
        pop_max: 0.5,
        pop_decay: 0.86,
        smoothing: 0.25,
    };

    /// Sandbox player: exaggerated, jelly-like
    pub const FREE_ROAM: SquashProfile = SquashProfile {
        speed_norm: 480.0,
        max_t: 0.35,
        sx_fall: 0.52,
        sx_rise: -0.18,
        sy_rise: 0.95,
        sy_fall: -0.25,
        pop_sx: 1.2,
        pop_sy: 1.0,
        pop_norm: 1200.0,
        pop_max: 2.0,
        pop_decay: 0.86,
        smoothing: 0.25,
    };
}

/// Smoothed scale pair plus the decaying landing pop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Squash {
    pub sx: f32,
    pub sy: f32,
    pub land_pop: f32,
}

impl Default for Squash {
    fn default() -> Self {
        Self {
            sx: 1.0,
            sy: 1.0,
            land_pop: 0.0,
        }
    }
}

impl Squash {
    /// Record a landing with the given impact speed
    pub fn land(&mut self, impact_vy: f32, profile: &SquashProfile) {
        self.land_pop = (impact_vy.abs() / profile.pop_norm).min(profile.pop_max);
    }

    /// Advance one frame toward the target scale for `vy`
    pub fn update(&mut self, vy: f32, profile: &SquashProfile) {
        self.land_pop *= profile.pop_decay;

        let t = (vy.abs() / profile.speed_norm).min(profile.max_t);
        let target_sx = 1.0
            + if vy > 0.0 {
                profile.sx_fall * t
            } else {
                profile.sx_rise * t
            }
            + self.land_pop * profile.pop_sx;
        let target_sy = 1.0
            + if vy < 0.0 {
                profile.sy_rise * t
            } else {
                profile.sy_fall * t
            }
            - self.land_pop * profile.pop_sy;

        self.sx = lerp(self.sx, target_sx, profile.smoothing);
        self.sy = lerp(self.sy, target_sy, profile.smoothing);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
