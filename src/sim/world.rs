//! Spring world
//!
//! A small point-mass integrator: circular nodes, distance springs (between
//! two nodes or a node and a fixed pin), a static bounding box and a set of
//! static rectangular colliders. Positions are solved with a few relaxation
//! passes per step, then velocities are recovered from the displacement.
//!
//! It knows nothing about meshes or AI. Callers address nodes and springs by
//! the index returned when they were added.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{circle_aabb_contact, circle_circle_contact};
use crate::Aabb;
use crate::error::MeshError;
use crate::tuning::friction_factor;

/// Collision group: nodes sharing a negative group never touch each other,
/// nodes sharing a positive group always do. Group 0 collides with anyone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFilter {
    pub group: i32,
}

impl CollisionFilter {
    pub fn can_collide(&self, other: &CollisionFilter) -> bool {
        if self.group == other.group && self.group != 0 {
            return self.group > 0;
        }
        true
    }
}

/// A circular point mass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    /// Zero for static nodes
    pub inv_mass: f32,
    pub restitution: f32,
    /// Velocity fraction lost per 1/60 s
    pub air_friction: f32,
    pub filter: CollisionFilter,
    #[serde(skip)]
    force: Vec2,
    #[serde(skip)]
    previous: Vec2,
}

impl Node {
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            radius,
            inv_mass: 1.0,
            restitution: 0.0,
            air_friction: 0.0,
            filter: CollisionFilter::default(),
            force: Vec2::ZERO,
            previous: position,
        }
    }

    /// Non-positive mass makes the node static
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.inv_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_air_friction(mut self, air_friction: f32) -> Self {
        self.air_friction = air_friction;
        self
    }

    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }
}

/// Second end of a spring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpringEnd {
    Node(usize),
    /// Fixed point in world space
    Pin(Vec2),
}

/// Distance constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub a: usize,
    pub b: SpringEnd,
    /// Fraction of the length error corrected per pass, in `[0, 1]`
    pub stiffness: f32,
    /// Fraction of the relative normal velocity removed per step
    pub damping: f32,
    /// Fixed at creation
    pub rest_length: f32,
}

/// Static walls around the simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Left wall x, ceiling y
    pub min: Vec2,
    /// Right wall x, floor y
    pub max: Vec2,
}

/// What a node hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Surface {
    Floor,
    Ceiling,
    LeftWall,
    RightWall,
    Collider(u32),
    /// Another node (from a different collision group)
    Node(usize),
}

impl Surface {
    pub fn is_side_wall(&self) -> bool {
        matches!(self, Surface::LeftWall | Surface::RightWall)
    }
}

/// Contact that began during a step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub node: usize,
    pub surface: Surface,
    /// Approach speed along the contact normal before the bounce (px/s)
    pub speed: f32,
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    node: usize,
    surface: Surface,
    normal: Vec2,
    approach: f32,
}

/// Point-mass and spring integrator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpringWorld {
    pub gravity: Vec2,
    /// Relaxation passes per step
    pub iterations: u32,
    pub bounds: Option<Bounds>,
    nodes: Vec<Node>,
    springs: Vec<Spring>,
    colliders: Vec<(u32, Aabb)>,
    next_group: i32,
    #[serde(skip)]
    contacts: Vec<Contact>,
}

impl SpringWorld {
    pub fn new(gravity: Vec2, iterations: u32) -> Self {
        Self {
            gravity,
            iterations: iterations.max(1),
            ..Default::default()
        }
    }

    /// Fresh negative group, unique within this world
    pub fn next_negative_group(&mut self) -> CollisionFilter {
        self.next_group -= 1;
        CollisionFilter {
            group: self.next_group,
        }
    }

    pub fn add_node(&mut self, mut node: Node) -> usize {
        node.previous = node.position;
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn check_node(&self, index: usize) -> Result<(), MeshError> {
        if index < self.nodes.len() {
            Ok(())
        } else {
            Err(MeshError::NodeOutOfBounds {
                index,
                count: self.nodes.len(),
            })
        }
    }

    /// Spring between two nodes, rest length taken from their current distance
    pub fn add_spring(
        &mut self,
        a: usize,
        b: usize,
        stiffness: f32,
        damping: f32,
    ) -> Result<usize, MeshError> {
        self.check_node(a)?;
        self.check_node(b)?;
        let rest = self.nodes[a].position.distance(self.nodes[b].position);
        self.push_spring(a, SpringEnd::Node(b), stiffness, damping, rest)
    }

    /// Spring from a node to a fixed anchor, rest length taken from geometry
    pub fn add_pin(
        &mut self,
        node: usize,
        anchor: Vec2,
        stiffness: f32,
        damping: f32,
    ) -> Result<usize, MeshError> {
        self.check_node(node)?;
        let rest = self.nodes[node].position.distance(anchor);
        self.push_spring(node, SpringEnd::Pin(anchor), stiffness, damping, rest)
    }

    fn push_spring(
        &mut self,
        a: usize,
        b: SpringEnd,
        stiffness: f32,
        damping: f32,
        rest_length: f32,
    ) -> Result<usize, MeshError> {
        self.springs.push(Spring {
            a,
            b,
            stiffness: stiffness.clamp(0.0, 1.0),
            damping: damping.clamp(0.0, 1.0),
            rest_length,
        });
        Ok(self.springs.len() - 1)
    }

    /// Move the anchor of a pin spring; no-op for node-node springs
    pub fn set_pin_anchor(&mut self, spring: usize, anchor: Vec2) {
        if let Some(Spring {
            b: SpringEnd::Pin(p),
            ..
        }) = self.springs.get_mut(spring)
        {
            *p = anchor;
        }
    }

    /// Insert, move or (with `None`) remove a static collider
    pub fn set_collider(&mut self, id: u32, rect: Option<Aabb>) {
        let slot = self.colliders.iter().position(|(cid, _)| *cid == id);
        match (slot, rect) {
            (Some(i), Some(rect)) => self.colliders[i].1 = rect,
            (Some(i), None) => {
                self.colliders.remove(i);
            }
            (None, Some(rect)) => self.colliders.push((id, rect)),
            (None, None) => {}
        }
    }

    /// Accumulate a force for the next step
    pub fn apply_force(&mut self, node: usize, force: Vec2) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.force += force;
        }
    }

    pub fn set_velocity(&mut self, node: usize, velocity: Vec2) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.velocity = velocity;
        }
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    pub fn spring(&self, index: usize) -> Option<&Spring> {
        self.springs.get(index)
    }

    pub fn colliders(&self) -> impl Iterator<Item = (u32, &Aabb)> {
        self.colliders.iter().map(|(id, rect)| (*id, rect))
    }

    /// Remove every node and spring; bounds and colliders stay
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.springs.clear();
        self.contacts.clear();
    }

    /// Advance by `dt` seconds and return the contacts made during the step
    pub fn step(&mut self, dt: f32) -> Vec<CollisionEvent> {
        self.contacts.clear();
        if dt <= 0.0 || self.nodes.is_empty() {
            return Vec::new();
        }

        self.integrate(dt);
        for _ in 0..self.iterations {
            self.solve_springs();
            self.solve_node_pairs();
            self.solve_static();
        }
        self.recover_velocities(dt);
        self.damp_springs();
        self.bounce()
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for node in self.nodes.iter_mut() {
            node.previous = node.position;
            if node.is_static() {
                node.force = Vec2::ZERO;
                continue;
            }
            node.velocity += (gravity + node.force * node.inv_mass) * dt;
            node.velocity *= friction_factor(node.air_friction, dt);
            node.position += node.velocity * dt;
            node.force = Vec2::ZERO;
        }
    }

    fn solve_springs(&mut self) {
        for spring in &self.springs {
            let a = spring.a;
            let (pb, wb) = match spring.b {
                SpringEnd::Node(b) => (self.nodes[b].position, self.nodes[b].inv_mass),
                SpringEnd::Pin(p) => (p, 0.0),
            };
            let pa = self.nodes[a].position;
            let wa = self.nodes[a].inv_mass;
            let w_sum = wa + wb;
            let delta = pb - pa;
            let dist = delta.length();
            if w_sum == 0.0 || dist < 1e-6 {
                continue;
            }
            let correction = delta / dist * (dist - spring.rest_length) * spring.stiffness / w_sum;
            self.nodes[a].position += correction * wa;
            if let SpringEnd::Node(b) = spring.b {
                self.nodes[b].position -= correction * wb;
            }
        }
    }

    /// Node pairs close enough to touch, found on a uniform grid whose
    /// cells are one node diameter wide. Sorted so pairs resolve in index
    /// order.
    fn candidate_pairs(&self) -> Vec<(usize, usize)> {
        let max_radius = self.nodes.iter().map(|n| n.radius).fold(0.0_f32, f32::max);
        if self.nodes.len() < 2 || max_radius <= 0.0 {
            return Vec::new();
        }
        let cell_size = max_radius * 2.0;
        let cell_of = |p: Vec2| {
            let c = (p / cell_size).floor();
            (c.x as i32, c.y as i32)
        };

        let mut grid: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            grid.entry(cell_of(node.position)).or_default().push(i);
        }

        let mut pairs = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let (cx, cy) = cell_of(node.position);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    let key = (cx.saturating_add(dx), cy.saturating_add(dy));
                    if let Some(cell) = grid.get(&key) {
                        pairs.extend(cell.iter().filter(|&&j| j > i).map(|&j| (i, j)));
                    }
                }
            }
        }
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    fn solve_node_pairs(&mut self) {
        for (i, j) in self.candidate_pairs() {
            let (a, b) = (&self.nodes[i], &self.nodes[j]);
            if !a.filter.can_collide(&b.filter) {
                continue;
            }
            let w_sum = a.inv_mass + b.inv_mass;
            if w_sum == 0.0 {
                continue;
            }
            let Some(hit) = circle_circle_contact(a.position, a.radius, b.position, b.radius) else {
                continue;
            };
            let approach = (b.velocity - a.velocity).dot(hit.normal).max(0.0);
            let (wa, wb) = (a.inv_mass / w_sum, b.inv_mass / w_sum);
            self.nodes[i].position += hit.normal * hit.penetration * wa;
            self.nodes[j].position -= hit.normal * hit.penetration * wb;
            self.record(i, Surface::Node(j), hit.normal, approach);
        }
    }

    fn solve_static(&mut self) {
        for i in 0..self.nodes.len() {
            if self.nodes[i].is_static() {
                continue;
            }
            if let Some(bounds) = self.bounds {
                self.clamp_to_bounds(i, bounds);
            }
            for c in 0..self.colliders.len() {
                let (id, rect) = self.colliders[c];
                let node = &self.nodes[i];
                if let Some(hit) = circle_aabb_contact(node.position, node.radius, &rect) {
                    let approach = (-node.velocity.dot(hit.normal)).max(0.0);
                    self.nodes[i].position += hit.normal * hit.penetration;
                    self.record(i, Surface::Collider(id), hit.normal, approach);
                }
            }
        }
    }

    fn clamp_to_bounds(&mut self, i: usize, bounds: Bounds) {
        let node = &self.nodes[i];
        let (p, r, v) = (node.position, node.radius, node.velocity);
        let walls = [
            (p.y + r > bounds.max.y, Surface::Floor, Vec2::NEG_Y),
            (p.y - r < bounds.min.y, Surface::Ceiling, Vec2::Y),
            (p.x - r < bounds.min.x, Surface::LeftWall, Vec2::X),
            (p.x + r > bounds.max.x, Surface::RightWall, Vec2::NEG_X),
        ];
        for (hit, surface, normal) in walls {
            if !hit {
                continue;
            }
            let position = &mut self.nodes[i].position;
            match surface {
                Surface::Floor => position.y = bounds.max.y - r,
                Surface::Ceiling => position.y = bounds.min.y + r,
                Surface::LeftWall => position.x = bounds.min.x + r,
                _ => position.x = bounds.max.x - r,
            }
            self.record(i, surface, normal, (-v.dot(normal)).max(0.0));
        }
    }

    fn record(&mut self, node: usize, surface: Surface, normal: Vec2, approach: f32) {
        if self
            .contacts
            .iter()
            .any(|c| c.node == node && c.surface == surface)
        {
            return;
        }
        self.contacts.push(Contact {
            node,
            surface,
            normal,
            approach,
        });
    }

    fn recover_velocities(&mut self, dt: f32) {
        for node in self.nodes.iter_mut() {
            if node.is_static() {
                node.velocity = Vec2::ZERO;
                continue;
            }
            node.velocity = (node.position - node.previous) / dt;
        }
    }

    fn damp_springs(&mut self) {
        for spring in &self.springs {
            if spring.damping == 0.0 {
                continue;
            }
            let a = spring.a;
            let (pb, vb, wb) = match spring.b {
                SpringEnd::Node(b) => {
                    let n = &self.nodes[b];
                    (n.position, n.velocity, n.inv_mass)
                }
                SpringEnd::Pin(p) => (p, Vec2::ZERO, 0.0),
            };
            let wa = self.nodes[a].inv_mass;
            let w_sum = wa + wb;
            let delta = pb - self.nodes[a].position;
            let dist = delta.length();
            if w_sum == 0.0 || dist < 1e-6 {
                continue;
            }
            let n = delta / dist;
            let relative = (vb - self.nodes[a].velocity).dot(n);
            let impulse = n * relative * spring.damping / w_sum;
            self.nodes[a].velocity += impulse * wa;
            if let SpringEnd::Node(b) = spring.b {
                self.nodes[b].velocity -= impulse * wb;
            }
        }
    }

    /// Reflect the normal velocity of every contacting node and report events
    fn bounce(&mut self) -> Vec<CollisionEvent> {
        let mut events = Vec::with_capacity(self.contacts.len());
        for contact in &self.contacts {
            let node = &mut self.nodes[contact.node];
            let vn = node.velocity.dot(contact.normal);
            if !matches!(contact.surface, Surface::Node(_)) && vn < contact.approach * node.restitution {
                // Replace the residual normal velocity with the bounce
                node.velocity += contact.normal * (contact.approach * node.restitution - vn);
            }
            events.push(CollisionEvent {
                node: contact.node,
                surface: contact.surface,
                speed: contact.approach,
            });
        }
        events
    }
}
