//! Shape generation for the runner's flat-colored geometry

use glam::Vec2;

use super::vertex::{ColorVertex, colors};
use crate::Aabb;
use crate::sim::Obstacle;
use crate::sim::squash::Squash;

/// Append two triangles covering `rect`
pub fn push_rect(out: &mut Vec<ColorVertex>, rect: &Aabb, color: [f32; 4]) {
    let min = rect.min();
    let max = rect.max();

    out.push(ColorVertex::new(min.x, min.y, color));
    out.push(ColorVertex::new(min.x, max.y, color));
    out.push(ColorVertex::new(max.x, min.y, color));

    out.push(ColorVertex::new(max.x, min.y, color));
    out.push(ColorVertex::new(min.x, max.y, color));
    out.push(ColorVertex::new(max.x, max.y, color));
}

/// Ground strip from `floor_y` to the bottom of the stage, with a thin edge
pub fn ground(stage: Vec2, floor_y: f32) -> Vec<ColorVertex> {
    let mut vertices = Vec::with_capacity(12);
    let depth = (stage.y - floor_y).max(0.0);
    push_rect(
        &mut vertices,
        &Aabb::from_top_left(0.0, floor_y, stage.x, depth),
        colors::GROUND,
    );
    push_rect(
        &mut vertices,
        &Aabb::from_top_left(0.0, floor_y, stage.x, 2.0_f32.min(depth)),
        colors::GROUND_EDGE,
    );
    vertices
}

/// One quad per obstacle; passed obstacles are dimmed
pub fn obstacles<'a, I>(obstacles: I) -> Vec<ColorVertex>
where
    I: IntoIterator<Item = &'a Obstacle>,
{
    let mut vertices = Vec::new();
    for o in obstacles {
        let color = if o.passed {
            colors::OBSTACLE_PASSED
        } else {
            colors::OBSTACLE
        };
        push_rect(&mut vertices, &o.aabb(), color);
    }
    vertices
}

/// Box of a sprite squashed about its feet
///
/// The bottom edge stays put so landing squash never sinks the sprite into
/// the ground.
pub fn squashed_box(body: &Aabb, squash: &Squash) -> Aabb {
    let size = body.size * Vec2::new(squash.sx, squash.sy);
    let feet = body.center.y + body.half().y;
    Aabb::new(Vec2::new(body.center.x, feet - size.y / 2.0), size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_covers_corners() {
        let mut out = Vec::new();
        push_rect(&mut out, &Aabb::from_top_left(10.0, 20.0, 30.0, 40.0), colors::OBSTACLE);
        assert_eq!(out.len(), 6);
        let xs: Vec<f32> = out.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = out.iter().map(|v| v.position[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 10.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 40.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), 20.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 60.0);
    }

    #[test]
    fn test_obstacle_colors() {
        let mut passed = Obstacle::new(100.0, 300.0, 20.0, 40.0);
        passed.passed = true;
        let fresh = Obstacle::new(200.0, 300.0, 20.0, 40.0);
        let out = obstacles([&passed, &fresh]);
        assert_eq!(out.len(), 12);
        assert_eq!(out[0].color, colors::OBSTACLE_PASSED);
        assert_eq!(out[6].color, colors::OBSTACLE);
    }

    #[test]
    fn test_squash_keeps_feet() {
        let body = Aabb::new(Vec2::new(100.0, 100.0), Vec2::new(88.0, 88.0));
        let squash = Squash {
            sx: 1.2,
            sy: 0.8,
            land_pop: 0.0,
        };
        let out = squashed_box(&body, &squash);
        assert!((out.max().y - body.max().y).abs() < 1e-4);
        assert!((out.size.x - 105.6).abs() < 1e-3);
        assert_eq!(out.center.x, 100.0);
    }
}
