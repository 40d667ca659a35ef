//! Per-frame render snapshot

use glam::Vec2;
use serde::Serialize;

use super::mesh::MeshBuffers;
use super::shapes;
use super::vertex::ColorVertex;
use crate::Aabb;
use crate::sim::squash::Squash;
use crate::sim::state::RunnerState;

/// The player sprite after squash
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpriteQuad {
    pub rect: Aabb,
}

impl SpriteQuad {
    pub fn new(body: &Aabb, squash: &Squash) -> Self {
        Self {
            rect: shapes::squashed_box(body, squash),
        }
    }
}

/// Jelly mesh buffers and their world transform
#[derive(Debug, Clone)]
pub struct JellyView {
    pub buffers: MeshBuffers,
    pub origin: Vec2,
    pub scale: f32,
}

/// Everything the host needs to draw one frame
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub stage: Vec2,
    /// Selected background image
    pub background: usize,
    /// Horizontal offset per parallax layer (empty outside the runner)
    pub parallax: Vec<f32>,
    pub ground: Vec<ColorVertex>,
    pub obstacles: Vec<ColorVertex>,
    pub player: Option<SpriteQuad>,
    /// Uploaded image used as the player and jelly texture
    pub skin: Option<String>,
    pub jelly: Option<JellyView>,
    pub hud: Option<String>,
    pub banner: Option<String>,
}

impl Frame {
    pub fn new(stage: Vec2, background: usize) -> Self {
        Self {
            stage,
            background,
            ..Default::default()
        }
    }

    /// Add the runner's layers: parallax, ground, obstacles, sprite and HUD
    pub fn with_runner(mut self, state: &RunnerState) -> Self {
        self.parallax = state.parallax.clone();
        self.ground = shapes::ground(state.stage, state.floor_y);
        self.obstacles = shapes::obstacles(&state.obstacles);
        self.player = Some(SpriteQuad::new(&state.runner_box(), &state.runner.squash));
        self.hud = Some(state.hud_text());
        self.banner = state.message.clone();
        self
    }

    pub fn with_player(mut self, body: &Aabb, squash: &Squash) -> Self {
        self.player = Some(SpriteQuad::new(body, squash));
        self
    }

    pub fn with_jelly(mut self, jelly: Option<JellyView>) -> Self {
        self.jelly = jelly;
        self
    }

    pub fn with_skin(mut self, skin: Option<&str>) -> Self {
        self.skin = skin.map(str::to_string);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Obstacle;
    use crate::tuning::RunnerTuning;

    #[test]
    fn test_runner_frame_layers() {
        let mut state = RunnerState::new(1, RunnerTuning::default());
        state.start(800.0, 400.0);
        state.obstacles.push_back(Obstacle::new(600.0, state.floor_y, 20.0, 40.0));

        let frame = Frame::new(state.stage, 2).with_runner(&state);
        assert_eq!(frame.background, 2);
        assert_eq!(frame.parallax.len(), 6);
        assert_eq!(frame.obstacles.len(), 6);
        assert_eq!(frame.ground.len(), 12);
        assert_eq!(frame.hud.as_deref(), Some("SCORE 000   BEST 000"));
        assert!(frame.banner.is_none());
        let sprite = frame.player.unwrap();
        assert_eq!(sprite.rect, state.runner_box());
    }

    #[test]
    fn test_sandbox_frame_has_no_hud() {
        let body = Aabb::from_top_left(10.0, 10.0, 88.0, 88.0);
        let frame = Frame::new(Vec2::new(640.0, 480.0), 0)
            .with_player(&body, &Squash::default())
            .with_skin(Some("blob.png"));
        assert!(frame.hud.is_none());
        assert!(frame.parallax.is_empty());
        assert_eq!(frame.skin.as_deref(), Some("blob.png"));
    }
}
