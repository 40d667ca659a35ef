//! Vertex types handed to the host renderer

use bytemuck::{Pod, Zeroable};

/// Flat-colored 2D vertex (ground, obstacles, debug boxes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl ColorVertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }
}

/// Textured vertex of the jelly mesh, in image pixel space
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

/// Colors for runner elements
pub mod colors {
    pub const GROUND: [f32; 4] = [0.16, 0.13, 0.2, 1.0];
    pub const GROUND_EDGE: [f32; 4] = [0.45, 0.4, 0.55, 1.0];
    pub const OBSTACLE: [f32; 4] = [0.85, 0.3, 0.35, 1.0];
    pub const OBSTACLE_PASSED: [f32; 4] = [0.55, 0.3, 0.4, 1.0];
    pub const HITBOX: [f32; 4] = [0.2, 1.0, 0.4, 0.35];
}
