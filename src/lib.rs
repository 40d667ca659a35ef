//! Jelly Runner - an endless runner and a soft-body jelly avatar
//!
//! Core modules:
//! - `sim`: Deterministic simulation (runner loop, obstacles, spring mesh, wander AI)
//! - `renderer`: Visual mesh buffers handed to the host renderer
//! - `platform`: Port between the simulation and the page (render, input, events)
//! - `persistence`: Backend records, validation and the media signing logic
//! - `tuning`: Data-driven game balance
//! - `session`: Per-page context object that drives one frame at a time

pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{BackendError, MeshError, SignError};
pub use highscores::Leaderboard;
pub use session::{Mode, Session};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta the runner integrates in one tick (seconds)
    pub const MAX_FRAME_DT: f32 = 0.05;
    /// Largest delta handed to the spring world in one step (seconds)
    pub const MAX_PHYSICS_DT: f32 = 0.032;

    /// Height of the ground strip at the bottom of the stage
    pub const GROUND_HEIGHT: f32 = 36.0;

    /// Player box defaults
    pub const PLAYER_WIDTH: f32 = 88.0;
    pub const PLAYER_HEIGHT: f32 = 88.0;
    /// Minimum distance of the runner from the left edge
    pub const PLAYER_MIN_X: f32 = 80.0;
    /// Runner x as a fraction of stage width
    pub const PLAYER_X_FRACTION: f32 = 0.22;

    /// Obstacles are evicted once their trailing edge passes this x
    pub const DESPAWN_X: f32 = -10.0;

    /// Delay before the first obstacle of a run (seconds)
    pub const FIRST_SPAWN_DELAY: f32 = 0.8;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Axis-aligned box described by its center and full size
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Build from the top-left corner, the way the page reports hitboxes
    pub fn from_top_left(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            center: Vec2::new(x + w / 2.0, y + h / 2.0),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn half(&self) -> Vec2 {
        self.size * 0.5
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half()
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half()
    }
}
