//! Data-driven game balance
//!
//! Every tunable lives here with its default. All structs accept partial
//! JSON so a page can override a single knob without restating the rest.

use serde::{Deserialize, Serialize};

use crate::consts::{PLAYER_HEIGHT, PLAYER_WIDTH};

/// Endless runner balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerTuning {
    /// Scroll speed at the start of a run (px/s)
    pub start_speed: f32,
    /// Scroll acceleration before the score bonus (px/s²)
    pub base_accel: f32,
    pub max_speed: f32,
    /// Extra acceleration per point of score
    pub accel_boost_per_score: f32,
    pub accel_boost_max: f32,

    /// Downward acceleration on the runner (px/s²)
    pub gravity: f32,
    /// Vertical velocity set by a jump (negative is up)
    pub jump_velocity: f32,

    /// Points per second survived
    pub time_score_rate: f32,
    /// Points per obstacle cleared
    pub pass_score_gain: f32,

    // === Spawn pacing ===
    pub spawn_gap_base: f32,
    pub spawn_gap_variance: f32,
    /// Lower bound of the randomized gap, before the cluster-width term
    pub spawn_gap_min: f32,
    /// Speed increase that shaves one second off the base gap
    pub spawn_gap_speed_divisor: f32,
    /// Floor on the speed used to convert cluster width into time
    pub spawn_min_px_per_sec: f32,

    pub player_width: f32,
    pub player_height: f32,

    /// Scroll factor per background layer, back to front
    pub parallax_factors: Vec<f32>,
}

impl Default for RunnerTuning {
    fn default() -> Self {
        Self {
            start_speed: 280.0,
            base_accel: 55.0,
            max_speed: 800.0,
            accel_boost_per_score: 0.7,
            accel_boost_max: 12.0,

            gravity: 1250.0,
            jump_velocity: -540.0,

            time_score_rate: 1.2,
            pass_score_gain: 5.0,

            spawn_gap_base: 1.1,
            spawn_gap_variance: 0.8,
            spawn_gap_min: 0.70,
            spawn_gap_speed_divisor: 1400.0,
            spawn_min_px_per_sec: 180.0,

            player_width: PLAYER_WIDTH,
            player_height: PLAYER_HEIGHT,

            parallax_factors: vec![0.12, 0.2, 0.35, 0.55, 0.8, 1.0],
        }
    }
}

/// Where a freshly built mesh is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpawnAt {
    /// Resting on the floor, centered horizontally
    #[default]
    Floor,
    /// Centered in the view
    Center,
}

/// Soft-body mesh construction options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshOptions {
    /// Grid vertices along x (clamped to `MIN_VERTS..=MAX_VERTS`)
    pub verts_x: usize,
    pub verts_y: usize,
    /// Long side of the displayed image in pixels; `None` fits to the view
    pub size_px: Option<f32>,
    /// Fraction of the view used when `size_px` is `None`
    pub scale_fit: f32,

    /// Structural spring stiffness (fraction of error corrected per pass)
    pub stiffness: f32,
    pub damping: f32,
    pub diagonal: bool,
    pub bend: bool,
    pub frame: bool,
    /// Weak anchor springs on the four corners
    pub pin_stiffness: Option<f32>,

    pub restitution: f32,
    /// Velocity lost per 1/60 s
    pub air_friction: f32,
    pub node_mass: f32,

    /// Initial pop: upward speed and random horizontal spread (px/s)
    pub kick: f32,
    pub spawn_at: SpawnAt,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            verts_x: 8,
            verts_y: 8,
            size_px: Some(140.0),
            scale_fit: 0.6,

            stiffness: 0.64,
            damping: 0.14,
            diagonal: true,
            bend: true,
            frame: true,
            pin_stiffness: Some(0.08),

            restitution: 0.28,
            air_friction: 0.02,
            node_mass: 1.0,

            kick: 60.0,
            spawn_at: SpawnAt::Floor,
        }
    }
}

/// Wander AI knobs. Tuned by feel; none of these is a physical constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderTuning {
    pub enabled: bool,
    /// Largest wander speed (px/s)
    pub max_vx: f32,
    /// Proportional gain toward the target velocity (1/s)
    pub gain: f32,
    /// Clamp on the corrective acceleration (px/s²)
    pub max_accel: f32,
    /// Above `max_vx * overspeed_factor` the body is slowed instead of steered
    pub overspeed_factor: f32,
    pub overspeed_decay: f32,
    pub retarget_min: f32,
    pub retarget_max: f32,

    pub jump_min: f32,
    pub jump_max: f32,
    pub jump_v_min: f32,
    pub jump_v_max: f32,
    pub side_kick: f32,

    /// Floor impact speed needed for a landing bounce (px/s)
    pub bounce_threshold: f32,
    pub bounce_scale: f32,
    pub bounce_side_kick: f32,
}

impl Default for WanderTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            max_vx: 70.0,
            gain: 4.0,
            max_accel: 240.0,
            overspeed_factor: 1.5,
            overspeed_decay: 0.9,
            retarget_min: 1.5,
            retarget_max: 3.0,

            jump_min: 0.9,
            jump_max: 1.5,
            jump_v_min: 330.0,
            jump_v_max: 432.0,
            side_kick: 40.0,

            bounce_threshold: 150.0,
            bounce_scale: 0.6,
            bounce_side_kick: 30.0,
        }
    }
}

/// Spring world integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    /// Constraint passes per step
    pub iterations: u32,
    /// Height of the ground strip the floor sits on
    pub floor_inset: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            gravity: 3200.0,
            iterations: 4,
            floor_inset: 20.0,
        }
    }
}

/// Pinned-corner oscillation for the standalone jelly stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoBounceTuning {
    pub enabled: bool,
    /// Oscillation frequency (Hz)
    pub freq: f32,
    /// Pin travel (px)
    pub amp: f32,
    /// Upward speed added to the bottom row on each rising edge (px/s)
    pub impulse: f32,
}

impl Default for AutoBounceTuning {
    fn default() -> Self {
        Self {
            enabled: false,
            freq: 3.1,
            amp: 18.0,
            impulse: 130.0,
        }
    }
}

/// Free-roam player box (sandbox mode)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub move_accel: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
    /// Velocity lost per 1/60 s
    pub air_friction: f32,
    /// Distance from the ground that still counts as standing
    pub ground_tolerance: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            move_accel: 2400.0,
            gravity: 800.0,
            jump_velocity: -552.0,
            air_friction: 0.155,
            ground_tolerance: 4.0,
        }
    }
}

/// All tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Tuning {
    pub runner: RunnerTuning,
    pub mesh: MeshOptions,
    pub wander: WanderTuning,
    pub world: WorldTuning,
    pub auto_bounce: AutoBounceTuning,
    pub player: PlayerTuning,
}

impl Tuning {
    /// Parse tunables from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Converts a "fraction lost per 1/60 s" friction into a multiplier for `dt`
#[inline]
pub fn friction_factor(air_friction: f32, dt: f32) -> f32 {
    (1.0 - air_friction.clamp(0.0, 1.0)).powf(dt * 60.0)
}
