//! Jelly scene: the spring world, the avatar mesh and what drives it
//!
//! The scene is stepped once per frame with a clamped delta. While the
//! runner is active the page disables it so the two modes never fight over
//! the player.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::mesh::SoftMesh;
use super::wander::Wander;
use super::world::{Bounds, CollisionEvent, SpringWorld};
use crate::Aabb;
use crate::consts::MAX_PHYSICS_DT;
use crate::error::MeshError;
use crate::renderer::{JellyView, MeshBuffers};
use crate::tuning::{AutoBounceTuning, Tuning};

/// Collider id of the player hitbox
pub const PLAYER_COLLIDER: u32 = 1;

/// Oscillates the top corner pins and kicks the bottom row on each upswing
#[derive(Debug, Clone)]
pub struct AutoBounce {
    pub tuning: AutoBounceTuning,
    time: f32,
    last_wave: f32,
}

impl AutoBounce {
    pub fn new(tuning: AutoBounceTuning) -> Self {
        Self {
            tuning,
            time: 0.0,
            last_wave: 0.0,
        }
    }

    /// Current wave value in `[-1, 1]`
    pub fn wave(&self) -> f32 {
        (TAU * self.tuning.freq * self.time).sin()
    }

    /// Returns true on a rising edge (the bottom row was kicked)
    pub fn step(&mut self, world: &mut SpringWorld, mesh: &SoftMesh, dt: f32) -> bool {
        self.time += dt;
        let wave = self.wave();
        for pin in mesh.pins().iter().filter(|p| p.corner.is_top()) {
            let anchor = pin.anchor + Vec2::Y * self.tuning.amp * wave;
            world.set_pin_anchor(pin.spring, anchor);
        }

        let rising = self.last_wave <= 0.0 && wave > 0.0;
        self.last_wave = wave;
        if rising {
            for &i in mesh.bottom_row() {
                if let Some(v) = world.node(i).map(|n| n.velocity) {
                    world.set_velocity(i, v - Vec2::Y * self.tuning.impulse);
                }
            }
        }
        rising
    }
}

/// World, mesh, wander AI and auto-bounce for one page
#[derive(Debug, Clone)]
pub struct JellyScene {
    pub tuning: Tuning,
    world: SpringWorld,
    mesh: Option<SoftMesh>,
    buffers: Option<MeshBuffers>,
    wander: Option<Wander>,
    auto_bounce: Option<AutoBounce>,
    enabled: bool,
    view: Vec2,
    rng: Pcg32,
    landing_bounces: u32,
}

impl JellyScene {
    pub fn new(view: Vec2, tuning: Tuning, seed: u64) -> Self {
        let world = SpringWorld::new(Vec2::new(0.0, tuning.world.gravity), tuning.world.iterations);
        let mut scene = Self {
            tuning,
            world,
            mesh: None,
            buffers: None,
            wander: None,
            auto_bounce: None,
            enabled: true,
            view,
            rng: Pcg32::seed_from_u64(seed),
            landing_bounces: 0,
        };
        scene.resize(view);
        scene
    }

    /// Floor line the mesh rests on
    pub fn floor_y(&self) -> f32 {
        self.view.y - self.tuning.world.floor_inset
    }

    /// Move the walls to a new view size
    pub fn resize(&mut self, view: Vec2) {
        self.view = view;
        self.world.bounds = Some(Bounds {
            min: Vec2::ZERO,
            max: Vec2::new(view.x, self.floor_y()),
        });
    }

    /// Replace the mesh with one built for an image of the given size
    pub fn spawn(&mut self, image: Vec2) -> Result<(), MeshError> {
        self.clear();
        let floor_y = self.floor_y();
        let mesh = SoftMesh::build(
            &mut self.world,
            image,
            self.view,
            floor_y,
            &self.tuning.mesh,
            &mut self.rng,
        )?;
        self.buffers = Some(mesh.buffers());
        self.wander = self
            .tuning
            .wander
            .enabled
            .then(|| Wander::new(self.tuning.wander.clone(), &mut self.rng));
        self.auto_bounce = self
            .tuning
            .auto_bounce
            .enabled
            .then(|| AutoBounce::new(self.tuning.auto_bounce.clone()));
        self.mesh = Some(mesh);
        log::info!("Jelly spawned from {}x{} image", image.x, image.y);
        Ok(())
    }

    /// Remove the mesh; walls and the player collider stay
    pub fn clear(&mut self) {
        if self.mesh.take().is_some() {
            log::info!("Jelly cleared");
        }
        self.world.clear();
        self.buffers = None;
        self.wander = None;
        self.auto_bounce = None;
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn mesh(&self) -> Option<&SoftMesh> {
        self.mesh.as_ref()
    }

    pub fn world(&self) -> &SpringWorld {
        &self.world
    }

    /// Hard landings the wander AI has bounced back up since creation
    pub fn landing_bounces(&self) -> u32 {
        self.landing_bounces
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Update (or with `None` remove) the player hitbox the jelly bumps into
    pub fn set_player_collider(&mut self, rect: Option<Aabb>) {
        self.world.set_collider(PLAYER_COLLIDER, rect);
    }

    pub fn set_auto_bounce(&mut self, enabled: bool) {
        self.tuning.auto_bounce.enabled = enabled;
        self.auto_bounce = (enabled && self.mesh.is_some())
            .then(|| AutoBounce::new(self.tuning.auto_bounce.clone()));
    }

    /// Advance one frame; `dt` is clamped to `MAX_PHYSICS_DT`
    pub fn step(&mut self, dt: f32) -> Vec<CollisionEvent> {
        let Some(mesh) = self.mesh.as_ref() else {
            return Vec::new();
        };
        if !self.enabled || dt <= 0.0 {
            return Vec::new();
        }
        let dt = dt.min(MAX_PHYSICS_DT);

        if let Some(bounce) = self.auto_bounce.as_mut() {
            bounce.step(&mut self.world, mesh, dt);
        }
        if let Some(wander) = self.wander.as_mut() {
            wander.pre_step(&mut self.world, mesh, dt, &mut self.rng);
        }
        let events = self.world.step(dt);
        if let Some(wander) = self.wander.as_mut() {
            if wander.post_step(&mut self.world, mesh, &events, &mut self.rng) {
                self.landing_bounces += 1;
            }
        }
        events
    }

    /// Synced render data for the current mesh
    pub fn view(&mut self) -> Option<JellyView> {
        let mesh = self.mesh.as_ref()?;
        let buffers = self.buffers.as_mut()?;
        mesh.sync(&self.world, buffers);
        Some(JellyView {
            buffers: buffers.clone(),
            origin: mesh.layout.origin,
            scale: mesh.layout.scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::Surface;

    const VIEW: Vec2 = Vec2::new(800.0, 600.0);
    const DT: f32 = 1.0 / 60.0;

    fn quiet_tuning() -> Tuning {
        let mut tuning = Tuning::default();
        tuning.wander.enabled = false;
        tuning.mesh.kick = 0.0;
        tuning
    }

    #[test]
    fn test_spawn_and_clear() {
        let mut scene = JellyScene::new(VIEW, Tuning::default(), 1);
        assert!(!scene.has_mesh());
        scene.spawn(Vec2::new(120.0, 80.0)).unwrap();
        assert!(scene.has_mesh());
        assert_eq!(scene.world().nodes().len(), 64);

        // Respawn replaces rather than adds
        scene.spawn(Vec2::new(120.0, 80.0)).unwrap();
        assert_eq!(scene.world().nodes().len(), 64);

        scene.clear();
        assert!(!scene.has_mesh());
        assert!(scene.world().nodes().is_empty());
        assert!(scene.view().is_none());
        assert!(scene.step(DT).is_empty());
    }

    #[test]
    fn test_spawn_error_leaves_scene_empty() {
        let mut scene = JellyScene::new(VIEW, Tuning::default(), 1);
        let err = scene.spawn(Vec2::new(0.0, 80.0)).unwrap_err();
        assert!(matches!(err, MeshError::EmptyImage { .. }));
        assert!(!scene.has_mesh());
    }

    #[test]
    fn test_mesh_stays_above_floor() {
        let mut scene = JellyScene::new(VIEW, Tuning::default(), 3);
        scene.spawn(Vec2::new(100.0, 100.0)).unwrap();
        let floor = scene.floor_y();
        for _ in 0..300 {
            scene.step(DT);
            for node in scene.world().nodes() {
                assert!(node.position.y + node.radius <= floor + 1e-2);
                assert!(node.position.is_finite());
            }
        }
    }

    #[test]
    fn test_disabled_scene_is_frozen() {
        let mut scene = JellyScene::new(VIEW, Tuning::default(), 3);
        scene.spawn(Vec2::new(100.0, 100.0)).unwrap();
        scene.set_enabled(false);
        let before: Vec<Vec2> = scene.world().nodes().iter().map(|n| n.position).collect();
        scene.step(DT);
        let after: Vec<Vec2> = scene.world().nodes().iter().map(|n| n.position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_player_collider_reports_contacts() {
        let mut scene = JellyScene::new(VIEW, quiet_tuning(), 3);
        scene.spawn(Vec2::new(100.0, 100.0)).unwrap();
        let mesh_left = scene.mesh().unwrap().layout.origin.x;
        // Box overlapping the left column of the mesh
        let rect = Aabb::from_top_left(mesh_left - 40.0, 0.0, 42.0, 600.0);
        scene.set_player_collider(Some(rect));
        let events = scene.step(DT);
        assert!(events.iter().any(|e| e.surface == Surface::Collider(PLAYER_COLLIDER)));
    }

    #[test]
    fn test_auto_bounce_moves_top_pins_and_kicks() {
        let mut tuning = quiet_tuning();
        tuning.auto_bounce.enabled = true;
        let mut scene = JellyScene::new(VIEW, tuning, 3);
        scene.spawn(Vec2::new(100.0, 100.0)).unwrap();

        let mesh = scene.mesh().unwrap().clone();
        let mut bounce = AutoBounce::new(scene.tuning.auto_bounce.clone());
        let mut world = scene.world().clone();

        // Quarter period: wave at its peak
        bounce.step(&mut world, &mesh, 0.25 / 3.1);
        for pin in mesh.pins() {
            let spring = world.spring(pin.spring).unwrap();
            let crate::sim::world::SpringEnd::Pin(anchor) = spring.b else {
                panic!("pin spring without anchor");
            };
            if pin.corner.is_top() {
                assert!((anchor.y - (pin.anchor.y + 18.0)).abs() < 1e-2);
            } else {
                assert_eq!(anchor, pin.anchor);
            }
        }

        // Half a period later the wave is negative, then it rises again
        assert!(!bounce.step(&mut world, &mesh, 0.5 / 3.1));
        let vy_before = world.node(mesh.bottom_row()[0]).unwrap().velocity.y;
        assert!(bounce.step(&mut world, &mesh, 0.5 / 3.1));
        let vy_after = world.node(mesh.bottom_row()[0]).unwrap().velocity.y;
        assert!((vy_after - (vy_before - 130.0)).abs() < 1e-3);
    }

    #[test]
    fn test_wander_jump_lands_with_bounce() {
        let mut tuning = Tuning::default();
        tuning.mesh.kick = 0.0;
        let mut scene = JellyScene::new(Vec2::new(960.0, 540.0), tuning, 11);
        scene.spawn(Vec2::new(256.0, 256.0)).unwrap();
        // Several timed jumps fit in five seconds
        for _ in 0..300 {
            scene.step(DT);
        }
        assert!(scene.landing_bounces() > 0);
    }

    #[test]
    fn test_auto_bounce_first_upswing_kicks() {
        let mut scene = JellyScene::new(VIEW, quiet_tuning(), 3);
        scene.spawn(Vec2::new(100.0, 100.0)).unwrap();
        let mesh = scene.mesh().unwrap().clone();
        let mut world = scene.world().clone();
        let mut bounce = AutoBounce::new(scene.tuning.auto_bounce.clone());

        // The wave starts at zero, so the first positive sample is an upswing
        assert!(bounce.step(&mut world, &mesh, DT));
        assert!(bounce.wave() > 0.0);
        assert!(!bounce.step(&mut world, &mesh, DT));
    }

    #[test]
    fn test_step_dt_is_clamped() {
        let mut a = JellyScene::new(VIEW, quiet_tuning(), 8);
        let mut b = JellyScene::new(VIEW, quiet_tuning(), 8);
        a.spawn(Vec2::new(100.0, 100.0)).unwrap();
        b.spawn(Vec2::new(100.0, 100.0)).unwrap();
        a.step(1.0);
        b.step(MAX_PHYSICS_DT);
        let pa: Vec<Vec2> = a.world().nodes().iter().map(|n| n.position).collect();
        let pb: Vec<Vec2> = b.world().nodes().iter().map(|n| n.position).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_view_syncs_buffers() {
        let mut scene = JellyScene::new(VIEW, quiet_tuning(), 2);
        scene.spawn(Vec2::new(100.0, 50.0)).unwrap();
        for _ in 0..10 {
            scene.step(DT);
        }
        let view = scene.view().unwrap();
        assert_eq!(view.buffers.vertices.len(), 64);
        let node = scene.world().node(scene.mesh().unwrap().nodes()[0]).unwrap();
        let expected = (node.position - view.origin) / view.scale;
        assert!((view.buffers.vertices[0].position[0] - expected.x).abs() < 1e-3);
        assert!((view.buffers.vertices[0].position[1] - expected.y).abs() < 1e-3);
    }
}
