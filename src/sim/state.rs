//! Runner game state and core simulation types
//!
//! Screen-space coordinates: x grows to the right, y grows downward, so the
//! ground baseline is the *largest* y the runner may reach.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::obstacle::{Obstacle, ObstacleVariant};
use super::squash::Squash;
use crate::Aabb;
use crate::consts::*;
use crate::tuning::RunnerTuning;

/// Current phase of the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Not started, or stopped by the page
    NotRunning,
    /// Active gameplay
    Running,
    /// Hit an obstacle; waiting for the jump key to restart
    Dead,
}

/// Discrete things that happened during a tick, drained by the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunnerEvent {
    Started,
    Stopped,
    Restarted,
    Jumped,
    Landed { impact: f32 },
    Spawned { variant: ObstacleVariant, pieces: usize },
    Passed { bonus: f32 },
    GameOver { score: u64, best: u64 },
}

/// The runner's kinematic state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    /// Horizontal center (fixed during a run)
    pub x: f32,
    /// Vertical center
    pub y: f32,
    pub vy: f32,
    pub on_ground: bool,
    pub squash: Squash,
}

impl Runner {
    fn grounded(x: f32, ground_y: f32) -> Self {
        Self {
            x,
            y: ground_y,
            vy: 0.0,
            on_ground: true,
            squash: Squash::default(),
        }
    }
}

/// Score accrual: continuous time points plus discrete pass bonuses
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Score {
    pub time_acc: f32,
    pub pass_points: f32,
    /// Displayed score, `floor(time_acc + pass_points)`
    pub current: u64,
    /// High-water mark across runs of this session
    pub best: u64,
}

impl Score {
    /// Clear the current run, keeping `best`
    pub fn reset(&mut self) {
        self.time_acc = 0.0;
        self.pass_points = 0.0;
        self.current = 0;
    }

    pub fn add_time(&mut self, points: f32) {
        self.time_acc += points.max(0.0);
    }

    pub fn add_pass(&mut self, points: f32) {
        self.pass_points += points.max(0.0);
    }

    /// Recompute the displayed score from the accumulators
    pub fn update(&mut self) {
        let total = (self.time_acc + self.pass_points).floor().max(0.0) as u64;
        self.observe(total);
    }

    /// Publish a score value and raise `best` if exceeded
    pub fn observe(&mut self, score: u64) {
        self.current = score;
        self.best = self.best.max(score);
    }
}

fn default_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

/// Complete runner state (deterministic for a given seed and input stream)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: RunPhase,
    pub tuning: RunnerTuning,
    /// Stage size in pixels
    pub stage: Vec2,
    /// Runner center y when standing
    pub ground_y: f32,
    /// Floor line obstacles stand on
    pub floor_y: f32,
    pub runner: Runner,
    pub score: Score,
    /// Scroll speed (px/s)
    pub speed: f32,
    /// Seconds until the next cluster
    pub spawn_in: f32,
    /// Live obstacles in spawn order (leftmost first)
    pub obstacles: VecDeque<Obstacle>,
    /// Horizontal tile offset per parallax layer
    pub parallax: Vec<f32>,
    /// Whether an uploaded background rides on top of the parallax stack
    pub custom_background: bool,
    /// Centered banner text (game over prompt)
    pub message: Option<String>,
    /// Simulation tick counter
    pub time_ticks: u64,
    #[serde(skip)]
    pub events: Vec<RunnerEvent>,
    #[serde(skip, default = "default_rng")]
    rng: Pcg32,
}

/// Banner shown after a collision
pub const GAME_OVER_MESSAGE: &str = "GAME OVER - SPACE to RESTART";

impl RunnerState {
    /// Create an idle runner with the given seed
    pub fn new(seed: u64, tuning: RunnerTuning) -> Self {
        let parallax = vec![0.0; tuning.parallax_factors.len()];
        Self {
            seed,
            phase: RunPhase::NotRunning,
            tuning,
            stage: Vec2::ZERO,
            ground_y: 0.0,
            floor_y: 0.0,
            runner: Runner::grounded(PLAYER_MIN_X, 0.0),
            score: Score::default(),
            speed: 0.0,
            spawn_in: FIRST_SPAWN_DELAY,
            obstacles: VecDeque::new(),
            parallax,
            custom_background: false,
            message: None,
            time_ticks: 0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    /// Begin a run on a stage of the given size. No-op while active.
    pub fn start(&mut self, width: f32, height: f32) {
        if self.phase != RunPhase::NotRunning {
            return;
        }
        self.stage = Vec2::new(width, height);
        self.floor_y = height - GROUND_HEIGHT;
        self.ground_y = self.floor_y - self.tuning.player_height / 2.0;
        self.reset_run();
        self.phase = RunPhase::Running;
        self.events.push(RunnerEvent::Started);
        log::info!(
            "Runner started on {}x{} stage (ground {})",
            width,
            height,
            self.ground_y
        );
    }

    /// Leave the runner; obstacles are discarded
    pub fn stop(&mut self) {
        if self.phase == RunPhase::NotRunning {
            return;
        }
        self.phase = RunPhase::NotRunning;
        self.obstacles.clear();
        self.message = None;
        self.events.push(RunnerEvent::Stopped);
        log::info!("Runner stopped (best {})", self.score.best);
    }

    /// Jump key: restarts after death, jumps when grounded.
    /// Returns true when the input was consumed.
    pub fn jump(&mut self) -> bool {
        match self.phase {
            RunPhase::NotRunning => false,
            RunPhase::Dead => {
                self.restart();
                true
            }
            RunPhase::Running => {
                if !self.runner.on_ground {
                    return false;
                }
                self.runner.vy = self.tuning.jump_velocity;
                self.runner.on_ground = false;
                self.events.push(RunnerEvent::Jumped);
                true
            }
        }
    }

    /// Re-initialize kinematics, score and obstacles after a death
    pub fn restart(&mut self) {
        self.reset_run();
        self.phase = RunPhase::Running;
        self.events.push(RunnerEvent::Restarted);
        log::info!("Runner restarted");
    }

    fn reset_run(&mut self) {
        let x = PLAYER_MIN_X.max(self.stage.x * PLAYER_X_FRACTION);
        self.runner = Runner::grounded(x, self.ground_y);
        self.score.reset();
        self.speed = self.tuning.start_speed;
        self.spawn_in = FIRST_SPAWN_DELAY;
        self.obstacles.clear();
        self.message = None;
    }

    /// Collision box of the runner (unscaled; squash is visual only)
    pub fn runner_box(&self) -> Aabb {
        Aabb::new(
            Vec2::new(self.runner.x, self.runner.y),
            Vec2::new(self.tuning.player_width, self.tuning.player_height),
        )
    }

    /// Trailing (left) edge of the runner
    pub fn runner_back(&self) -> f32 {
        self.runner.x - self.tuning.player_width / 2.0
    }

    /// Toggle the uploaded-background parallax layer
    pub fn set_custom_background(&mut self, enabled: bool) {
        self.custom_background = enabled;
        let layers = self.tuning.parallax_factors.len() + usize::from(enabled);
        self.parallax.resize(layers, 0.0);
    }

    /// Scroll factor for parallax layer `i`
    pub fn parallax_factor(&self, i: usize) -> f32 {
        self.tuning.parallax_factors.get(i).copied().unwrap_or(1.0)
    }

    /// `SCORE 007   BEST 042`
    pub fn hud_text(&self) -> String {
        format!(
            "SCORE {:03}   BEST {:03}",
            self.score.current, self.score.best
        )
    }

    pub(crate) fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Take the events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<RunnerEvent> {
        std::mem::take(&mut self.events)
    }
}
