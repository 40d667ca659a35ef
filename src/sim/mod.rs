//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (spawn order for obstacles, grid order for nodes)
//! - No rendering or platform dependencies beyond plain buffers

pub mod collision;
pub mod jelly;
pub mod mesh;
pub mod obstacle;
pub mod player;
pub mod squash;
pub mod state;
pub mod tick;
pub mod wander;
pub mod world;

pub use collision::{aabb_overlap, circle_aabb_contact, circle_circle_contact};
pub use jelly::{AutoBounce, JellyScene, PLAYER_COLLIDER};
pub use mesh::{LinkKind, MeshLayout, SoftMesh};
pub use obstacle::{Cluster, Obstacle, ObstacleVariant, build_cluster, spawn_cluster};
pub use player::{FreePlayer, MoveInput};
pub use squash::{Squash, SquashProfile};
pub use state::{RunPhase, RunnerEvent, RunnerState, Score};
pub use tick::{TickInput, next_spawn_delay, tick};
pub use wander::Wander;
pub use world::{CollisionEvent, SpringWorld, Surface};
