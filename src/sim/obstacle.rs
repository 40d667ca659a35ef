//! Obstacle generation for the runner
//!
//! Clusters are picked by weighted random variant, then each rectangle gets
//! its own randomized size. Obstacles are anchored on the ground baseline:
//! `y` is the bottom edge, `x` the horizontal center.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Aabb;

/// Span reported for an empty cluster
pub const EMPTY_CLUSTER_SPAN: f32 = 30.0;

/// A single obstacle rectangle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Horizontal center
    pub x: f32,
    /// Bottom edge (ground baseline, raised for stacked pieces)
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Set once the runner's trailing edge has cleared it
    pub passed: bool,
}

impl Obstacle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            passed: false,
        }
    }

    #[inline]
    pub fn leading_edge(&self) -> f32 {
        self.x - self.width / 2.0
    }

    #[inline]
    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Collision box (center + size)
    pub fn aabb(&self) -> Aabb {
        Aabb::new(
            Vec2::new(self.x, self.y - self.height / 2.0),
            Vec2::new(self.width, self.height),
        )
    }
}

/// Cluster shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleVariant {
    Single,
    Wide,
    Tall,
    Pair,
    Stack,
    Triple,
}

impl ObstacleVariant {
    /// Spawn weights, in draw order
    pub const WEIGHTS: [(ObstacleVariant, u32); 6] = [
        (ObstacleVariant::Single, 4),
        (ObstacleVariant::Wide, 3),
        (ObstacleVariant::Tall, 2),
        (ObstacleVariant::Pair, 2),
        (ObstacleVariant::Stack, 1),
        (ObstacleVariant::Triple, 1),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObstacleVariant::Single => "single",
            ObstacleVariant::Wide => "wide",
            ObstacleVariant::Tall => "tall",
            ObstacleVariant::Pair => "pair",
            ObstacleVariant::Stack => "stack",
            ObstacleVariant::Triple => "triple",
        }
    }

    /// Number of rectangles this variant produces
    pub fn piece_count(&self) -> usize {
        match self {
            ObstacleVariant::Single | ObstacleVariant::Wide | ObstacleVariant::Tall => 1,
            ObstacleVariant::Pair | ObstacleVariant::Stack => 2,
            ObstacleVariant::Triple => 3,
        }
    }
}

/// Weighted pick: draw `r` in `[0, total)`, subtract weights in order until
/// `r <= 0`. Falls back to the first entry.
pub fn pick_weighted<T: Copy, R: Rng + ?Sized>(entries: &[(T, u32)], rng: &mut R) -> Option<T> {
    let first = entries.first()?.0;
    let total: u32 = entries.iter().map(|(_, w)| *w).sum();
    if total == 0 {
        return Some(first);
    }
    let mut r = rng.random::<f32>() * total as f32;
    for &(value, weight) in entries {
        r -= weight as f32;
        if r <= 0.0 {
            return Some(value);
        }
    }
    Some(first)
}

/// Obstacles created by one spawn, plus their horizontal extent
#[derive(Debug, Clone)]
pub struct Cluster {
    pub variant: ObstacleVariant,
    pub obstacles: Vec<Obstacle>,
    /// Trailing edge of the last piece minus leading edge of the first
    pub span: f32,
}

impl Cluster {
    fn measure(variant: ObstacleVariant, obstacles: Vec<Obstacle>) -> Self {
        let span = match (obstacles.first(), obstacles.last()) {
            (Some(first), Some(last)) => last.trailing_edge() - first.leading_edge(),
            _ => EMPTY_CLUSTER_SPAN,
        };
        Self {
            variant,
            obstacles,
            span,
        }
    }
}

/// Inclusive integer range as f32 (sizes are whole pixels)
fn randi<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> f32 {
    rng.random_range(min..=max) as f32
}

/// Build the rectangles for `variant` at the spawn edge
///
/// `spawn_x` is the right edge of the stage; every piece starts fully
/// off-screen. `ground_y` is the baseline pieces stand on.
pub fn build_cluster<R: Rng + ?Sized>(
    variant: ObstacleVariant,
    spawn_x: f32,
    ground_y: f32,
    rng: &mut R,
) -> Cluster {
    let mut pieces = Vec::with_capacity(variant.piece_count());
    let mut make = |w: f32, h: f32, dx: f32, dy: f32| {
        pieces.push(Obstacle::new(spawn_x + w / 2.0 + dx, ground_y + dy, w, h));
    };

    match variant {
        ObstacleVariant::Single => {
            let w = randi(rng, 16, 28);
            let h = randi(rng, 30, 60);
            make(w, h, 0.0, 0.0);
        }
        ObstacleVariant::Wide => {
            let w = randi(rng, 40, 90);
            let h = randi(rng, 22, 36);
            make(w, h, 0.0, 0.0);
        }
        ObstacleVariant::Tall => {
            let w = randi(rng, 14, 22);
            let h = randi(rng, 60, 96);
            make(w, h, 0.0, 0.0);
        }
        ObstacleVariant::Pair => {
            let w1 = randi(rng, 16, 28);
            let h1 = randi(rng, 28, 56);
            let gap = randi(rng, 24, 40);
            make(w1, h1, 0.0, 0.0);
            let w2 = randi(rng, 16, 28);
            let h2 = randi(rng, 28, 56);
            make(w2, h2, w1 / 2.0 + gap + w2 / 2.0, 0.0);
        }
        ObstacleVariant::Stack => {
            let w = randi(rng, 18, 26);
            let h1 = randi(rng, 24, 40);
            let h2 = randi(rng, 24, 40);
            make(w, h1, 0.0, 0.0);
            make((w * 0.9).round(), h2, 0.0, -h1);
        }
        ObstacleVariant::Triple => {
            let w = randi(rng, 16, 26);
            let gap = randi(rng, 20, 34);
            let heights = [randi(rng, 30, 60), randi(rng, 30, 60), randi(rng, 30, 60)];
            for (i, h) in heights.into_iter().enumerate() {
                let i = i as f32;
                make(w, h, i * (w + gap), 0.0);
            }
        }
    }

    Cluster::measure(variant, pieces)
}

/// Pick a variant by weight and build it
pub fn spawn_cluster<R: Rng + ?Sized>(spawn_x: f32, ground_y: f32, rng: &mut R) -> Cluster {
    let variant =
        pick_weighted(&ObstacleVariant::WEIGHTS, rng).unwrap_or(ObstacleVariant::Single);
    build_cluster(variant, spawn_x, ground_y, rng)
}
