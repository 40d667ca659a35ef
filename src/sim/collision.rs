//! Collision tests for the runner and the spring world
//!
//! Everything here works on axis-aligned boxes and circles. Comparisons are
//! strict: shapes that only touch do not collide.

use glam::Vec2;

use crate::Aabb;

/// Overlap test between two boxes given by center and full size
///
/// Hit iff `|dx| < (w1 + w2) / 2` and `|dy| < (h1 + h2) / 2`.
#[inline]
pub fn aabb_overlap(a: &Aabb, b: &Aabb) -> bool {
    let d = (a.center - b.center).abs();
    let reach = (a.size + b.size) * 0.5;
    d.x < reach.x && d.y < reach.y
}

/// Contact between a circle and a box
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// Unit normal pointing from the box toward the circle
    pub normal: Vec2,
    /// Overlap depth along `normal`
    pub penetration: f32,
}

/// Circle vs box; `None` when they do not overlap
pub fn circle_aabb_contact(center: Vec2, radius: f32, rect: &Aabb) -> Option<Contact> {
    let min = rect.min();
    let max = rect.max();
    let closest = center.clamp(min, max);
    let delta = center - closest;
    let dist_sq = delta.length_squared();

    if dist_sq > 1e-8 {
        if dist_sq >= radius * radius {
            return None;
        }
        let dist = dist_sq.sqrt();
        return Some(Contact {
            normal: delta / dist,
            penetration: radius - dist,
        });
    }

    // Center inside the box: push out through the nearest face
    let to_left = center.x - min.x;
    let to_right = max.x - center.x;
    let to_top = center.y - min.y;
    let to_bottom = max.y - center.y;
    let nearest = to_left.min(to_right).min(to_top).min(to_bottom);

    let normal = if nearest == to_left {
        Vec2::NEG_X
    } else if nearest == to_right {
        Vec2::X
    } else if nearest == to_top {
        Vec2::NEG_Y
    } else {
        Vec2::Y
    };
    Some(Contact {
        normal,
        penetration: nearest + radius,
    })
}

/// Circle vs circle; normal points from `b` toward `a`
pub fn circle_circle_contact(a: Vec2, ra: f32, b: Vec2, rb: f32) -> Option<Contact> {
    let delta = a - b;
    let reach = ra + rb;
    let dist_sq = delta.length_squared();
    if dist_sq >= reach * reach {
        return None;
    }
    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::NEG_Y };
    Some(Contact {
        normal,
        penetration: reach - dist,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn boxed(x: f32, y: f32, w: f32, h: f32) -> Aabb {
        Aabb::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_clear_miss() {
        let player = boxed(100.0, 100.0, 88.0, 88.0);
        let obstacle = boxed(300.0, 120.0, 20.0, 40.0);
        assert!(!aabb_overlap(&player, &obstacle));
    }

    #[test]
    fn test_touching_is_not_a_hit() {
        // Edges meet exactly at x = 144
        let player = boxed(100.0, 100.0, 88.0, 88.0);
        let obstacle = boxed(154.0, 100.0, 20.0, 20.0);
        assert!(!aabb_overlap(&player, &obstacle));

        // Same along y
        let below = boxed(100.0, 154.0, 20.0, 20.0);
        assert!(!aabb_overlap(&player, &below));
    }

    #[test]
    fn test_overlap() {
        let player = boxed(100.0, 100.0, 88.0, 88.0);
        let obstacle = boxed(153.9, 100.0, 20.0, 20.0);
        assert!(aabb_overlap(&player, &obstacle));
    }

    #[test]
    fn test_circle_aabb_outside_and_inside() {
        let rect = boxed(0.0, 0.0, 20.0, 20.0);
        assert!(circle_aabb_contact(Vec2::new(20.0, 0.0), 5.0, &rect).is_none());

        let c = circle_aabb_contact(Vec2::new(13.0, 0.0), 5.0, &rect).unwrap();
        assert!((c.normal - Vec2::X).length() < 1e-5);
        assert!((c.penetration - 2.0).abs() < 1e-5);

        let inside = circle_aabb_contact(Vec2::new(0.0, 8.0), 2.0, &rect).unwrap();
        assert_eq!(inside.normal, Vec2::Y);
        assert!((inside.penetration - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_circle_circle() {
        assert!(circle_circle_contact(Vec2::ZERO, 1.0, Vec2::new(2.0, 0.0), 1.0).is_none());
        let c = circle_circle_contact(Vec2::ZERO, 1.0, Vec2::new(1.5, 0.0), 1.0).unwrap();
        assert_eq!(c.normal, Vec2::NEG_X);
        assert!((c.penetration - 0.5).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_overlap_matches_formula(
            x in -500.0f32..500.0, y in -500.0f32..500.0,
            w in 1.0f32..200.0, h in 1.0f32..200.0,
            cx in -500.0f32..500.0, cy in -500.0f32..500.0,
            cw in 1.0f32..200.0, ch in 1.0f32..200.0,
        ) {
            let a = boxed(x, y, w, h);
            let b = boxed(cx, cy, cw, ch);
            let expected = (x - cx).abs() < (w + cw) / 2.0 && (y - cy).abs() < (h + ch) / 2.0;
            prop_assert_eq!(aabb_overlap(&a, &b), expected);
            prop_assert_eq!(aabb_overlap(&a, &b), aabb_overlap(&b, &a));
        }
    }
}
